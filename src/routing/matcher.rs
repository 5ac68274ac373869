//! Path pattern matching module
//!
//! Patterns are literal segments with at most one `<name>` variable, e.g.
//! `/error/custom/<error_type>`. A variable matches exactly one non-empty
//! segment; trailing slashes are significant. Request paths are
//! percent-decoded before matching.

use std::borrow::Cow;

/// One segment of a parsed pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Param(&'static str),
}

/// Parsed route path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: &'static str,
    segments: Vec<Segment>,
}

/// Values captured from the request path
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathParams<'a> {
    pairs: Vec<(&'static str, Cow<'a, str>)>,
}

impl PathParams<'_> {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_ref())
    }

    fn into_owned(self) -> PathParams<'static> {
        PathParams {
            pairs: self
                .pairs
                .into_iter()
                .map(|(key, value)| (key, Cow::Owned(value.into_owned())))
                .collect(),
        }
    }
}

fn split(path: &str) -> Option<std::str::Split<'_, char>> {
    path.strip_prefix('/').map(|rest| rest.split('/'))
}

impl PathPattern {
    /// Parse a pattern; it must start with `/`
    pub fn parse(raw: &'static str) -> Result<Self, String> {
        let parts = split(raw).ok_or_else(|| format!("Pattern must start with '/': {raw}"))?;

        let segments: Vec<Segment> = parts
            .map(|part| {
                part.strip_prefix('<')
                    .and_then(|p| p.strip_suffix('>'))
                    .map_or(Segment::Literal(part), Segment::Param)
            })
            .collect();

        let params = segments
            .iter()
            .filter(|s| matches!(s, Segment::Param(_)))
            .count();
        if params > 1 {
            return Err(format!("Pattern has more than one path variable: {raw}"));
        }
        if segments.iter().any(|s| *s == Segment::Param("")) {
            return Err(format!("Pattern has an unnamed path variable: {raw}"));
        }

        Ok(Self { raw, segments })
    }

    pub const fn as_str(&self) -> &'static str {
        self.raw
    }

    /// Match a request path, returning captured variables on success
    ///
    /// A path that is not valid UTF-8 once decoded is matched as sent.
    pub fn matches<'p>(&self, path: &'p str) -> Option<PathParams<'p>> {
        match urlencoding::decode(path) {
            Ok(Cow::Owned(decoded)) => self
                .match_decoded(&decoded)
                .map(PathParams::into_owned),
            _ => self.match_decoded(path),
        }
    }

    fn match_decoded<'p>(&self, path: &'p str) -> Option<PathParams<'p>> {
        let mut parts = split(path)?;
        let mut params = PathParams::default();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if *literal == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.pairs.push((*name, Cow::Borrowed(part)));
                }
                _ => return None,
            }
        }

        // Leftover segments mean the path is longer than the pattern
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}
