//! Viewport environment and media query evaluation.
//!
//! The grammar covers what the hooks need:
//!
//! ```text
//! list      := query ("," query)*
//! query     := ["not" | "only"] [media-type "and"] condition ("and" condition)*
//!            | ["not" | "only"] media-type
//! condition := "(" feature [":" value] ")"
//! ```
//!
//! Supported features: `min-width`, `max-width`, `min-height`, `max-height`
//! (`px`, `em` at 16px, or a bare number), `orientation`,
//! `prefers-color-scheme`, `prefers-reduced-motion`. A bare `(feature)` is
//! true when the feature is present and non-zero.

use std::fmt;

use tendril_core::{Dispose, Emitter, Signal, Source};

use crate::MediaQueryError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Environment {
    pub width: u32,
    pub height: u32,
    pub color_scheme: ColorScheme,
    pub reduced_motion: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            color_scheme: ColorScheme::Light,
            reduced_motion: false,
        }
    }
}

impl Environment {
    pub fn orientation(&self) -> Orientation {
        if self.height >= self.width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

/// The window's observable environment. Clones share state.
#[derive(Clone, Debug)]
pub struct Viewport {
    env: Signal<Environment>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Environment::default())
    }
}

impl Viewport {
    pub fn new(env: Environment) -> Self {
        Self {
            env: Signal::new(env),
        }
    }

    pub fn environment(&self) -> Environment {
        self.env.get()
    }

    pub fn signal(&self) -> Signal<Environment> {
        self.env.clone()
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.env.set_if_changed(Environment {
            width,
            height,
            ..self.env.get()
        });
    }

    pub fn set_color_scheme(&self, scheme: ColorScheme) {
        self.env.set_if_changed(Environment {
            color_scheme: scheme,
            ..self.env.get()
        });
    }

    pub fn set_reduced_motion(&self, on: bool) {
        self.env.set_if_changed(Environment {
            reduced_motion: on,
            ..self.env.get()
        });
    }

    pub fn matches(&self, query: &MediaQueryList) -> bool {
        query.evaluate(&self.env.get())
    }

    fn id(&self) -> usize {
        self.env.id()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Feature {
    MinWidth(f32),
    MaxWidth(f32),
    MinHeight(f32),
    MaxHeight(f32),
    Orientation(Orientation),
    ColorScheme(ColorScheme),
    ReducedMotion(bool),
    AnyWidth,
    AnyHeight,
    AnyOrientation,
    AnyColorScheme,
    AnyReducedMotion,
}

impl Feature {
    fn evaluate(&self, env: &Environment) -> bool {
        let (w, h) = (env.width as f32, env.height as f32);
        match *self {
            Feature::MinWidth(px) => w >= px,
            Feature::MaxWidth(px) => w <= px,
            Feature::MinHeight(px) => h >= px,
            Feature::MaxHeight(px) => h <= px,
            Feature::Orientation(o) => env.orientation() == o,
            Feature::ColorScheme(s) => env.color_scheme == s,
            Feature::ReducedMotion(r) => env.reduced_motion == r,
            Feature::AnyWidth => env.width > 0,
            Feature::AnyHeight => env.height > 0,
            Feature::AnyOrientation | Feature::AnyColorScheme => true,
            Feature::AnyReducedMotion => env.reduced_motion,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MediaType {
    All,
    Screen,
    Print,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MediaQuery {
    negated: bool,
    media: MediaType,
    conditions: Vec<Feature>,
}

impl MediaQuery {
    pub fn evaluate(&self, env: &Environment) -> bool {
        // Everything here renders to a screen.
        let media_ok = self.media != MediaType::Print;
        let matched = media_ok && self.conditions.iter().all(|c| c.evaluate(env));
        matched != self.negated
    }
}

/// Comma-separated queries; true when any matches.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaQueryList {
    source: String,
    queries: Vec<MediaQuery>,
}

impl fmt::Display for MediaQueryList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl MediaQueryList {
    pub fn parse(input: &str) -> Result<Self, MediaQueryError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MediaQueryError::Empty);
        }
        let queries = trimmed
            .split(',')
            .map(parse_query)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: trimmed.to_string(),
            queries,
        })
    }

    pub fn evaluate(&self, env: &Environment) -> bool {
        self.queries.iter().any(|q| q.evaluate(env))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::str::FromStr for MediaQueryList {
    type Err = MediaQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Group(&'a str),
}

fn tokenize(input: &str) -> Result<Vec<Token<'_>>, MediaQueryError> {
    let mut out = Vec::new();
    let mut rest = input.trim_start();
    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('(') {
            let close = inner
                .find(')')
                .ok_or_else(|| MediaQueryError::Syntax(rest.to_string()))?;
            out.push(Token::Group(inner[..close].trim()));
            rest = inner[close + 1..].trim_start();
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '(')
                .unwrap_or(rest.len());
            let word = &rest[..end];
            if word.contains(')') {
                return Err(MediaQueryError::Syntax(word.to_string()));
            }
            out.push(Token::Word(word));
            rest = rest[end..].trim_start();
        }
    }
    Ok(out)
}

fn parse_query(input: &str) -> Result<MediaQuery, MediaQueryError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(MediaQueryError::Empty);
    }
    let mut it = tokens.into_iter().peekable();

    let mut negated = false;
    if let Some(Token::Word(w)) = it.peek() {
        if w.eq_ignore_ascii_case("not") {
            negated = true;
            it.next();
        } else if w.eq_ignore_ascii_case("only") {
            it.next();
        }
    }

    let mut media = MediaType::All;
    let mut conditions = Vec::new();
    let mut expect_condition = true;

    if let Some(Token::Word(w)) = it.peek() {
        media = match w.to_ascii_lowercase().as_str() {
            "all" => MediaType::All,
            "screen" => MediaType::Screen,
            "print" => MediaType::Print,
            other => return Err(MediaQueryError::Syntax(other.to_string())),
        };
        it.next();
        expect_condition = false;
    }

    for tok in it {
        match tok {
            Token::Word(w) if w.eq_ignore_ascii_case("and") && !expect_condition => {
                expect_condition = true;
            }
            Token::Group(g) if expect_condition => {
                conditions.push(parse_feature(g)?);
                expect_condition = false;
            }
            Token::Word(w) => return Err(MediaQueryError::Syntax(w.to_string())),
            Token::Group(g) => return Err(MediaQueryError::Syntax(format!("({g})"))),
        }
    }
    if expect_condition {
        return Err(MediaQueryError::Syntax(input.trim().to_string()));
    }

    Ok(MediaQuery {
        negated,
        media,
        conditions,
    })
}

fn parse_length(feature: &str, raw: &str) -> Result<f32, MediaQueryError> {
    let bad = || MediaQueryError::BadValue {
        feature: feature.to_string(),
        value: raw.to_string(),
    };
    let v = raw.trim().to_ascii_lowercase();
    let (num, scale) = if let Some(n) = v.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = v.strip_suffix("rem") {
        (n, 16.0)
    } else if let Some(n) = v.strip_suffix("em") {
        (n, 16.0)
    } else {
        (v.as_str(), 1.0)
    };
    let n: f32 = num.trim().parse().map_err(|_| bad())?;
    if !n.is_finite() || n < 0.0 {
        return Err(bad());
    }
    Ok(n * scale)
}

fn parse_feature(group: &str) -> Result<Feature, MediaQueryError> {
    let (name, value) = match group.split_once(':') {
        Some((n, v)) => (n.trim().to_ascii_lowercase(), Some(v.trim().to_ascii_lowercase())),
        None => (group.trim().to_ascii_lowercase(), None),
    };
    let bad = |v: &str| MediaQueryError::BadValue {
        feature: name.clone(),
        value: v.to_string(),
    };

    let Some(value) = value else {
        return match name.as_str() {
            "width" => Ok(Feature::AnyWidth),
            "height" => Ok(Feature::AnyHeight),
            "orientation" => Ok(Feature::AnyOrientation),
            "prefers-color-scheme" => Ok(Feature::AnyColorScheme),
            "prefers-reduced-motion" => Ok(Feature::AnyReducedMotion),
            _ => Err(MediaQueryError::UnknownFeature(name.clone())),
        };
    };

    match name.as_str() {
        "min-width" => parse_length(&name, &value).map(Feature::MinWidth),
        "max-width" => parse_length(&name, &value).map(Feature::MaxWidth),
        "min-height" => parse_length(&name, &value).map(Feature::MinHeight),
        "max-height" => parse_length(&name, &value).map(Feature::MaxHeight),
        "orientation" => match value.as_str() {
            "portrait" => Ok(Feature::Orientation(Orientation::Portrait)),
            "landscape" => Ok(Feature::Orientation(Orientation::Landscape)),
            v => Err(bad(v)),
        },
        "prefers-color-scheme" => match value.as_str() {
            "dark" => Ok(Feature::ColorScheme(ColorScheme::Dark)),
            "light" => Ok(Feature::ColorScheme(ColorScheme::Light)),
            v => Err(bad(v)),
        },
        "prefers-reduced-motion" => match value.as_str() {
            "reduce" => Ok(Feature::ReducedMotion(true)),
            "no-preference" => Ok(Feature::ReducedMotion(false)),
            v => Err(bad(v)),
        },
        _ => Err(MediaQueryError::UnknownFeature(name.clone())),
    }
}

/// Whether a query matches. Without a viewport, or with an unparsable query,
/// the value is `false` for good.
pub struct MediaQuerySource {
    viewport: Option<Viewport>,
    query: String,
}

impl MediaQuerySource {
    pub fn new(viewport: Option<&Viewport>, query: impl Into<String>) -> Self {
        Self {
            viewport: viewport.cloned(),
            query: query.into(),
        }
    }

    fn parsed(&self) -> Option<MediaQueryList> {
        match MediaQueryList::parse(&self.query) {
            Ok(q) => Some(q),
            Err(e) => {
                log::warn!("media: cannot parse `{}`: {e}", self.query);
                None
            }
        }
    }
}

impl Source for MediaQuerySource {
    type Value = bool;
    type Key = (Option<usize>, String);

    fn key(&self) -> Self::Key {
        (self.viewport.as_ref().map(Viewport::id), self.query.clone())
    }

    fn initial(&self) -> bool {
        match (&self.viewport, MediaQueryList::parse(&self.query)) {
            (Some(vp), Ok(q)) => vp.matches(&q),
            _ => false,
        }
    }

    fn attach(&self, emit: Emitter<bool>) -> Dispose {
        let Some(vp) = &self.viewport else {
            return Dispose::noop();
        };
        let Some(query) = self.parsed() else {
            return Dispose::noop();
        };
        // Catch up with anything that changed between initial() and now.
        emit.emit_if_changed(vp.matches(&query));

        let env = vp.signal();
        let id = env.subscribe(move |e| {
            emit.emit_if_changed(query.evaluate(e));
        });
        Dispose::new(move || {
            env.unsubscribe(id);
        })
    }
}

/// Current `(width, height)` of a viewport; `(0, 0)` without one.
pub struct WindowSizeSource {
    viewport: Option<Viewport>,
}

impl WindowSizeSource {
    pub fn new(viewport: Option<&Viewport>) -> Self {
        Self {
            viewport: viewport.cloned(),
        }
    }
}

impl Source for WindowSizeSource {
    type Value = (u32, u32);
    type Key = Option<usize>;

    fn key(&self) -> Self::Key {
        self.viewport.as_ref().map(Viewport::id)
    }

    fn initial(&self) -> (u32, u32) {
        self.viewport
            .as_ref()
            .map(|vp| {
                let e = vp.environment();
                (e.width, e.height)
            })
            .unwrap_or((0, 0))
    }

    fn attach(&self, emit: Emitter<(u32, u32)>) -> Dispose {
        let Some(vp) = &self.viewport else {
            return Dispose::noop();
        };
        let env = vp.signal();
        let id = env.subscribe(move |e| {
            emit.emit_if_changed((e.width, e.height));
        });
        Dispose::new(move || {
            env.unsubscribe(id);
        })
    }
}
