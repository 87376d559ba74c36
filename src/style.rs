//! Style identifiers, hierarchical resolution, and overlay composition.
//!
//! The actual terminal styling engine (the thing that turns colors and
//! modifiers into escape codes) is an external collaborator (spec §1); this
//! module only defines the [`Style`] trait boundary it must satisfy plus the
//! semantic [`StyleKind`] hierarchy and the [`blend`] composition rule used
//! by the renderer.

use std::collections::HashMap;

use crate::token::{Token, TokenKind};

/// Start of the reserved range for caller-defined overlay kinds.
pub const USER_OVERLAY_BASE: u32 = 1_000_000;

/// A closed, Pygments-like hierarchy of semantic style categories, plus a
/// reserved range (`>= USER_OVERLAY_BASE`) for caller-defined overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Text,
    Literal,
    LiteralString,
    LiteralStringDouble,
    LiteralStringSingle,
    LiteralNumber,
    LiteralNumberInteger,
    LiteralNumberFloat,
    LiteralNumberHex,
    LiteralNumberOct,
    LiteralNumberBin,
    LiteralNumberInfinity,
    LiteralNumberNaN,
    LiteralBoolean,
    LiteralNull,
    LiteralNullImplicit,
    Name,
    NameTag,
    NameAnchor,
    NameAlias,
    NameAliasMerge,
    NameDecorator,
    Punctuation,
    PunctuationMappingValue,
    PunctuationMappingStart,
    PunctuationMappingEnd,
    PunctuationSequenceEntry,
    PunctuationSequenceStart,
    PunctuationSequenceEnd,
    PunctuationCollectEntry,
    PunctuationHeading,
    PunctuationBlockLiteral,
    PunctuationBlockFolded,
    Comment,
    CommentPreproc,
    Generic,
    GenericDeleted,
    GenericInserted,
    GenericError,
    GenericErrorInvalid,
    GenericErrorUnknown,
    Search,
    SearchSelected,
    /// Caller-defined overlay kind. The numeric id is offset by
    /// [`USER_OVERLAY_BASE`] when exposed via [`StyleKind::overlay_id`].
    Overlay(u32),
}

impl StyleKind {
    /// The parent category to fall back to when no explicit override is
    /// registered for this kind. `None` for the root (`Text`) and for
    /// `Overlay`, which never inherits.
    pub fn parent(&self) -> Option<StyleKind> {
        use StyleKind::*;
        match self {
            Text => None,
            Literal => Some(Text),
            LiteralString => Some(Literal),
            LiteralStringDouble | LiteralStringSingle => Some(LiteralString),
            LiteralNumber => Some(Literal),
            LiteralNumberInteger | LiteralNumberFloat | LiteralNumberHex | LiteralNumberOct
            | LiteralNumberBin | LiteralNumberInfinity | LiteralNumberNaN => Some(LiteralNumber),
            LiteralBoolean => Some(Literal),
            LiteralNull => Some(Literal),
            LiteralNullImplicit => Some(LiteralNull),
            Name => Some(Text),
            NameTag | NameAnchor | NameAlias | NameAliasMerge | NameDecorator => Some(Name),
            Punctuation => Some(Text),
            PunctuationMappingValue
            | PunctuationMappingStart
            | PunctuationMappingEnd
            | PunctuationSequenceEntry
            | PunctuationSequenceStart
            | PunctuationSequenceEnd
            | PunctuationCollectEntry
            | PunctuationHeading
            | PunctuationBlockLiteral
            | PunctuationBlockFolded => Some(Punctuation),
            Comment => Some(Text),
            CommentPreproc => Some(Comment),
            Generic => Some(Text),
            GenericDeleted | GenericInserted | GenericError => Some(Generic),
            GenericErrorInvalid | GenericErrorUnknown => Some(GenericError),
            Search => Some(Text),
            SearchSelected => Some(Search),
            Overlay(_) => None,
        }
    }

    /// Caller-facing numeric id for an [`StyleKind::Overlay`] kind.
    pub fn overlay_id(id: u32) -> StyleKind {
        StyleKind::Overlay(USER_OVERLAY_BASE + id)
    }

    /// Kebab-case name, e.g. `NameTag` -> `"name-tag"`. Used by test/demo
    /// `Style` implementations that wrap content in descriptive tags.
    pub fn tag_name(&self) -> String {
        use StyleKind::*;
        let name = match self {
            Text => "text",
            Literal => "literal",
            LiteralString => "literal-string",
            LiteralStringDouble => "literal-string-double",
            LiteralStringSingle => "literal-string-single",
            LiteralNumber => "literal-number",
            LiteralNumberInteger => "literal-number-integer",
            LiteralNumberFloat => "literal-number-float",
            LiteralNumberHex => "literal-number-hex",
            LiteralNumberOct => "literal-number-oct",
            LiteralNumberBin => "literal-number-bin",
            LiteralNumberInfinity => "literal-number-infinity",
            LiteralNumberNaN => "literal-number-nan",
            LiteralBoolean => "literal-boolean",
            LiteralNull => "literal-null",
            LiteralNullImplicit => "literal-null-implicit",
            Name => "name",
            NameTag => "name-tag",
            NameAnchor => "name-anchor",
            NameAlias => "name-alias",
            NameAliasMerge => "name-alias-merge",
            NameDecorator => "name-decorator",
            Punctuation => "punctuation",
            PunctuationMappingValue => "punctuation-mapping-value",
            PunctuationMappingStart => "punctuation-mapping-start",
            PunctuationMappingEnd => "punctuation-mapping-end",
            PunctuationSequenceEntry => "punctuation-sequence-entry",
            PunctuationSequenceStart => "punctuation-sequence-start",
            PunctuationSequenceEnd => "punctuation-sequence-end",
            PunctuationCollectEntry => "punctuation-collect-entry",
            PunctuationHeading => "punctuation-heading",
            PunctuationBlockLiteral => "punctuation-block-literal",
            PunctuationBlockFolded => "punctuation-block-folded",
            Comment => "comment",
            CommentPreproc => "comment-preproc",
            Generic => "generic",
            GenericDeleted => "generic-deleted",
            GenericInserted => "generic-inserted",
            GenericError => "generic-error",
            GenericErrorInvalid => "generic-error-invalid",
            GenericErrorUnknown => "generic-error-unknown",
            Search => "search",
            SearchSelected => "search-selected",
            Overlay(id) => return format!("overlay-{id}"),
        };
        name.to_string()
    }

    /// Stable numeric key for use as an [`crate::line::Source`] overlay map
    /// key. `Source` (module C) is built before this module (D) in the
    /// dependency order (spec §2), so it stores overlays under a plain
    /// `u32` rather than a `StyleKind`; this is the bidirectional mapping
    /// between the two.
    pub fn to_overlay_key(&self) -> u32 {
        use StyleKind::*;
        match self {
            Overlay(id) => *id,
            Text => 0,
            Literal => 1,
            LiteralString => 2,
            LiteralStringDouble => 3,
            LiteralStringSingle => 4,
            LiteralNumber => 5,
            LiteralNumberInteger => 6,
            LiteralNumberFloat => 7,
            LiteralNumberHex => 8,
            LiteralNumberOct => 9,
            LiteralNumberBin => 10,
            LiteralNumberInfinity => 11,
            LiteralNumberNaN => 12,
            LiteralBoolean => 13,
            LiteralNull => 14,
            LiteralNullImplicit => 15,
            Name => 16,
            NameTag => 17,
            NameAnchor => 18,
            NameAlias => 19,
            NameAliasMerge => 20,
            NameDecorator => 21,
            Punctuation => 22,
            PunctuationMappingValue => 23,
            PunctuationMappingStart => 24,
            PunctuationMappingEnd => 25,
            PunctuationSequenceEntry => 26,
            PunctuationSequenceStart => 27,
            PunctuationSequenceEnd => 28,
            PunctuationCollectEntry => 29,
            PunctuationHeading => 30,
            PunctuationBlockLiteral => 31,
            PunctuationBlockFolded => 32,
            Comment => 33,
            CommentPreproc => 34,
            Generic => 35,
            GenericDeleted => 36,
            GenericInserted => 37,
            GenericError => 38,
            GenericErrorInvalid => 39,
            GenericErrorUnknown => 40,
            Search => 41,
            SearchSelected => 42,
        }
    }

    /// Inverse of [`StyleKind::to_overlay_key`].
    pub fn from_overlay_key(key: u32) -> StyleKind {
        use StyleKind::*;
        if key >= USER_OVERLAY_BASE {
            return Overlay(key);
        }
        match key {
            0 => Text,
            1 => Literal,
            2 => LiteralString,
            3 => LiteralStringDouble,
            4 => LiteralStringSingle,
            5 => LiteralNumber,
            6 => LiteralNumberInteger,
            7 => LiteralNumberFloat,
            8 => LiteralNumberHex,
            9 => LiteralNumberOct,
            10 => LiteralNumberBin,
            11 => LiteralNumberInfinity,
            12 => LiteralNumberNaN,
            13 => LiteralBoolean,
            14 => LiteralNull,
            15 => LiteralNullImplicit,
            16 => Name,
            17 => NameTag,
            18 => NameAnchor,
            19 => NameAlias,
            20 => NameAliasMerge,
            21 => NameDecorator,
            22 => Punctuation,
            23 => PunctuationMappingValue,
            24 => PunctuationMappingStart,
            25 => PunctuationMappingEnd,
            26 => PunctuationSequenceEntry,
            27 => PunctuationSequenceStart,
            28 => PunctuationSequenceEnd,
            29 => PunctuationCollectEntry,
            30 => PunctuationHeading,
            31 => PunctuationBlockLiteral,
            32 => PunctuationBlockFolded,
            33 => Comment,
            34 => CommentPreproc,
            35 => Generic,
            36 => GenericDeleted,
            37 => GenericInserted,
            38 => GenericError,
            39 => GenericErrorInvalid,
            40 => GenericErrorUnknown,
            41 => Search,
            42 => SearchSelected,
            other => Overlay(other),
        }
    }
}

/// Deterministic mapping from a token to its semantic style, per spec §4.4:
/// 1. preceded by an anchor indicator -> `NameAnchor`
/// 2. preceded by an alias indicator -> `NameAlias`
/// 3. a string token immediately followed by a mapping-value indicator -> `NameTag`
/// 4. otherwise, a fixed table from token kind to style kind.
pub fn type_style(tokens: &[Token], index: usize) -> StyleKind {
    if index > 0 {
        match tokens[index - 1].kind {
            TokenKind::AnchorIndicator => return StyleKind::NameAnchor,
            TokenKind::AliasIndicator => return StyleKind::NameAlias,
            _ => {}
        }
    }
    let this = &tokens[index];
    let is_string = matches!(
        this.kind,
        TokenKind::StringPlain | TokenKind::StringDoubleQuoted | TokenKind::StringSingleQuoted
    );
    if is_string {
        if let Some(next) = tokens.get(index + 1) {
            if next.kind == TokenKind::MappingValue {
                return StyleKind::NameTag;
            }
        }
    }
    fixed_table(this.kind)
}

fn fixed_table(kind: TokenKind) -> StyleKind {
    use StyleKind::*;
    match kind {
        TokenKind::StringPlain => LiteralString,
        TokenKind::StringDoubleQuoted => LiteralStringDouble,
        TokenKind::StringSingleQuoted => LiteralStringSingle,
        TokenKind::Integer => LiteralNumberInteger,
        TokenKind::IntegerHex => LiteralNumberHex,
        TokenKind::IntegerOctal => LiteralNumberOct,
        TokenKind::IntegerBinary => LiteralNumberBin,
        TokenKind::Float => LiteralNumberFloat,
        TokenKind::FloatInfinity => LiteralNumberInfinity,
        TokenKind::FloatNaN => LiteralNumberNaN,
        TokenKind::Bool => LiteralBoolean,
        TokenKind::Null => LiteralNull,
        TokenKind::NullImplicit => LiteralNullImplicit,
        TokenKind::AnchorIndicator => NameAnchor,
        TokenKind::AliasIndicator => NameAlias,
        TokenKind::MergeKey => NameAliasMerge,
        TokenKind::Tag => NameDecorator,
        TokenKind::MappingValue => PunctuationMappingValue,
        TokenKind::MappingStart => PunctuationMappingStart,
        TokenKind::MappingEnd => PunctuationMappingEnd,
        TokenKind::SequenceEntry => PunctuationSequenceEntry,
        TokenKind::SequenceStart => PunctuationSequenceStart,
        TokenKind::SequenceEnd => PunctuationSequenceEnd,
        TokenKind::CollectEntry => PunctuationCollectEntry,
        TokenKind::DocumentHeading => PunctuationHeading,
        TokenKind::BlockLiteral => PunctuationBlockLiteral,
        TokenKind::BlockFolded => PunctuationBlockFolded,
        TokenKind::Comment => Comment,
        TokenKind::Directive => CommentPreproc,
        TokenKind::Whitespace | TokenKind::Unknown => Text,
    }
}

/// An 8-bit-per-channel RGB color, the common currency for [`Style`]
/// foreground/background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The opaque terminal styling engine this crate renders through. A style
/// value supports composing with another (an overlay "wraps" a base style)
/// and applying itself to a string (producing the final styled text).
///
/// Implementations are free to represent "apply a then wrap with b" however
/// suits their output (nested ANSI SGR codes, XML-ish tags for tests, bracket
/// markers, etc); this crate never inspects the representation directly.
pub trait Style: Clone {
    fn foreground(&self) -> Option<Rgb>;
    fn background(&self) -> Option<Rgb>;

    /// Apply `a` then wrap the result with `b`'s non-color attributes.
    /// Implementations should NOT blend colors here; [`blend`] recomputes
    /// foreground/background separately and calls [`Style::with_colors`].
    fn compose(&self, other: &Self) -> Self;

    /// Rebuild this style with the given resolved colors, keeping every
    /// other attribute.
    fn with_colors(&self, foreground: Option<Rgb>, background: Option<Rgb>) -> Self;

    fn apply(&self, text: &str) -> String;
}

/// Compose two effective styles: "apply `a` then wrap with `b`", with
/// foreground/background resolved to the CIE LAB midpoint when both sides
/// specify a color (else whichever side has one, else none).
///
/// Composition is associative: `blend(blend(a, b), c) == blend(a, blend(b, c))`
/// in its observable (color + wrapping) behavior, so overlay ordering alone
/// (not grouping) determines the rendered result.
pub fn blend<S: Style>(a: &S, b: &S) -> S {
    let composed = a.compose(b);
    let fg = blend_channel(a.foreground(), b.foreground());
    let bg = blend_channel(a.background(), b.background());
    composed.with_colors(fg, bg)
}

fn blend_channel(a: Option<Rgb>, b: Option<Rgb>) -> Option<Rgb> {
    match (a, b) {
        (Some(x), Some(y)) => Some(lab_midpoint(x, y)),
        (Some(x), None) => Some(x),
        (None, Some(y)) => Some(y),
        (None, None) => None,
    }
}

/// Blend two colors by averaging in CIE LAB space and converting back,
/// which tracks human perception of "midpoint" far better than averaging
/// sRGB channels directly.
pub fn lab_midpoint(a: Rgb, b: Rgb) -> Rgb {
    let (al, aa, ab) = rgb_to_lab(a);
    let (bl, ba, bb) = rgb_to_lab(b);
    lab_to_rgb((al + bl) / 2.0, (aa + ba) / 2.0, (ab + bb) / 2.0)
}

fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let v = if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn rgb_to_lab(c: Rgb) -> (f64, f64, f64) {
    let r = srgb_to_linear(c.r);
    let g = srgb_to_linear(c.g);
    let b = srgb_to_linear(c.b);

    // sRGB -> XYZ (D65)
    let x = r * 0.4124564 + g * 0.3575761 + b * 0.1804375;
    let y = r * 0.2126729 + g * 0.7151522 + b * 0.0721750;
    let z = r * 0.0193339 + g * 0.1191920 + b * 0.9503041;

    // D65 reference white
    let xn = 0.95047;
    let yn = 1.00000;
    let zn = 1.08883;

    let fx = lab_f(x / xn);
    let fy = lab_f(y / yn);
    let fz = lab_f(z / zn);

    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let bb = 200.0 * (fy - fz);
    (l, a, bb)
}

fn lab_to_rgb(l: f64, a: f64, b: f64) -> Rgb {
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let xn = 0.95047;
    let yn = 1.00000;
    let zn = 1.08883;

    let x = xn * lab_f_inv(fx);
    let y = yn * lab_f_inv(fy);
    let z = zn * lab_f_inv(fz);

    let r = x * 3.2404542 + y * -1.5371385 + z * -0.4985314;
    let g = x * -0.9692660 + y * 1.8760108 + z * 0.0415560;
    let bl = x * 0.0556434 + y * -0.2040259 + z * 1.0572252;

    Rgb::new(linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(bl))
}

fn lab_f(t: f64) -> f64 {
    const DELTA: f64 = 6.0 / 29.0;
    if t > DELTA.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f64) -> f64 {
    const DELTA: f64 = 6.0 / 29.0;
    if t > DELTA {
        t.powi(3)
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

/// Precomputed, O(1)-lookup effective style per [`StyleKind`], resolved at
/// construction by walking each category's parent chain until an explicit
/// override is found (falling back to `base` otherwise). Caller-defined
/// overlay kinds (`StyleKind::Overlay(id)`, spec §4.4's reserved `>=
/// USER_OVERLAY_BASE` range) never inherit through the named hierarchy, so
/// their overrides live in a separate map keyed by the actual `u32` id.
#[derive(Debug, Clone)]
pub struct Styles<S: Style> {
    base: S,
    resolved: HashMap<StyleKindKey, S>,
    overlay_overrides: HashMap<u32, S>,
}

/// Key for the *named* category resolution cache. Overlay kinds are never
/// stored under this key space — they resolve through `overlay_overrides`
/// instead, keyed by their real id, so distinct overlay ids each keep their
/// own registered style rather than collapsing onto one sentinel.
type StyleKindKey = u8;

/// Stable key for a named category. Panics if called with `Overlay(_)`;
/// callers must route those through `overlay_overrides` instead.
fn kind_key(kind: StyleKind) -> StyleKindKey {
    use StyleKind::*;
    match kind {
        Text => 0,
        Literal => 1,
        LiteralString => 2,
        LiteralStringDouble => 3,
        LiteralStringSingle => 4,
        LiteralNumber => 5,
        LiteralNumberInteger => 6,
        LiteralNumberFloat => 7,
        LiteralNumberHex => 8,
        LiteralNumberOct => 9,
        LiteralNumberBin => 10,
        LiteralNumberInfinity => 11,
        LiteralNumberNaN => 12,
        LiteralBoolean => 13,
        LiteralNull => 14,
        LiteralNullImplicit => 15,
        Name => 16,
        NameTag => 17,
        NameAnchor => 18,
        NameAlias => 19,
        NameAliasMerge => 20,
        NameDecorator => 21,
        Punctuation => 22,
        PunctuationMappingValue => 23,
        PunctuationMappingStart => 24,
        PunctuationMappingEnd => 25,
        PunctuationSequenceEntry => 26,
        PunctuationSequenceStart => 27,
        PunctuationSequenceEnd => 28,
        PunctuationCollectEntry => 29,
        PunctuationHeading => 30,
        PunctuationBlockLiteral => 31,
        PunctuationBlockFolded => 32,
        Comment => 33,
        CommentPreproc => 34,
        Generic => 35,
        GenericDeleted => 36,
        GenericInserted => 37,
        GenericError => 38,
        GenericErrorInvalid => 39,
        GenericErrorUnknown => 40,
        Search => 41,
        SearchSelected => 42,
        Overlay(id) => unreachable!("overlay kind {id} must resolve via overlay_overrides, not kind_key"),
    }
}

const NAMED_KINDS: &[StyleKind] = {
    use StyleKind::*;
    &[
        Text,
        Literal,
        LiteralString,
        LiteralStringDouble,
        LiteralStringSingle,
        LiteralNumber,
        LiteralNumberInteger,
        LiteralNumberFloat,
        LiteralNumberHex,
        LiteralNumberOct,
        LiteralNumberBin,
        LiteralNumberInfinity,
        LiteralNumberNaN,
        LiteralBoolean,
        LiteralNull,
        LiteralNullImplicit,
        Name,
        NameTag,
        NameAnchor,
        NameAlias,
        NameAliasMerge,
        NameDecorator,
        Punctuation,
        PunctuationMappingValue,
        PunctuationMappingStart,
        PunctuationMappingEnd,
        PunctuationSequenceEntry,
        PunctuationSequenceStart,
        PunctuationSequenceEnd,
        PunctuationCollectEntry,
        PunctuationHeading,
        PunctuationBlockLiteral,
        PunctuationBlockFolded,
        Comment,
        CommentPreproc,
        Generic,
        GenericDeleted,
        GenericInserted,
        GenericError,
        GenericErrorInvalid,
        GenericErrorUnknown,
        Search,
        SearchSelected,
    ]
};

impl<S: Style> Styles<S> {
    /// Build a resolver from a base style plus explicit `(kind, style)`
    /// overrides. Every named category gets an effective style computed by
    /// walking up the parent chain until an override is found; an override
    /// registered for an `Overlay(id)` kind is kept verbatim under its own
    /// id (overlay kinds have no parent to inherit through).
    pub fn new(base: S, overrides: impl IntoIterator<Item = (StyleKind, S)>) -> Self {
        let mut explicit: HashMap<StyleKindKey, S> = HashMap::new();
        let mut overlay_overrides: HashMap<u32, S> = HashMap::new();
        for (kind, style) in overrides {
            match kind {
                StyleKind::Overlay(id) => {
                    overlay_overrides.insert(id, style);
                }
                _ => {
                    explicit.insert(kind_key(kind), style);
                }
            }
        }

        let mut resolved = HashMap::new();
        for &kind in NAMED_KINDS {
            let effective = resolve_chain(kind, &explicit, &base);
            resolved.insert(kind_key(kind), effective);
        }

        Self {
            base,
            resolved,
            overlay_overrides,
        }
    }

    /// O(1) lookup of the effective style for `kind`. An `Overlay(id)` kind
    /// resolves to its own registered override if one was passed to
    /// [`Styles::new`], falling back to the base style otherwise.
    pub fn style(&self, kind: StyleKind) -> &S {
        if let StyleKind::Overlay(id) = kind {
            return self.overlay_overrides.get(&id).unwrap_or(&self.base);
        }
        self.resolved
            .get(&kind_key(kind))
            .unwrap_or(&self.base)
    }

    pub fn base(&self) -> &S {
        &self.base
    }
}

fn resolve_chain<S: Style>(kind: StyleKind, explicit: &HashMap<StyleKindKey, S>, base: &S) -> S {
    let mut current = Some(kind);
    while let Some(k) = current {
        if let Some(style) = explicit.get(&kind_key(k)) {
            return style.clone();
        }
        current = k.parent();
    }
    base.clone()
}

#[cfg(test)]
pub mod testing {
    //! Minimal `Style` implementations used only by this crate's own test
    //! scenarios (spec §8's literal S1–S6 cases): one that wraps highlighted
    //! text in `[...]`, and one that wraps every styled run in an XML-ish
    //! `<kind>...</kind>` tag named after its `StyleKind`.

    use super::{Rgb, Style, StyleKind};

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct BracketStyle {
        pub highlighted: bool,
    }

    impl Style for BracketStyle {
        fn foreground(&self) -> Option<Rgb> {
            None
        }
        fn background(&self) -> Option<Rgb> {
            None
        }
        fn compose(&self, other: &Self) -> Self {
            BracketStyle {
                highlighted: self.highlighted || other.highlighted,
            }
        }
        fn with_colors(&self, _fg: Option<Rgb>, _bg: Option<Rgb>) -> Self {
            self.clone()
        }
        fn apply(&self, text: &str) -> String {
            if self.highlighted {
                format!("[{text}]")
            } else {
                text.to_string()
            }
        }
    }

    pub fn bracket_overlay() -> BracketStyle {
        BracketStyle { highlighted: true }
    }

    /// A `Styles<TagStyle>` with an identity override for every named
    /// category, so `style(kind)` always renders `kind`'s own tag rather
    /// than falling back to the base style's tag.
    pub fn identity_styles() -> super::Styles<TagStyle> {
        let overrides = super::NAMED_KINDS.iter().map(|&k| (k, TagStyle::new(k)));
        super::Styles::new(TagStyle::new(StyleKind::Text), overrides)
    }

    /// A no-op `Style`: `apply` returns its input unchanged. Used by test
    /// scenarios (diff, finder) that assert on plain rendered text rather
    /// than on style markup.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct PlainStyle;

    impl Style for PlainStyle {
        fn foreground(&self) -> Option<Rgb> {
            None
        }
        fn background(&self) -> Option<Rgb> {
            None
        }
        fn compose(&self, _other: &Self) -> Self {
            PlainStyle
        }
        fn with_colors(&self, _fg: Option<Rgb>, _bg: Option<Rgb>) -> Self {
            PlainStyle
        }
        fn apply(&self, text: &str) -> String {
            text.to_string()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct TagStyle {
        pub kind: StyleKind,
    }

    impl TagStyle {
        pub fn new(kind: StyleKind) -> Self {
            Self { kind }
        }
    }

    impl Style for TagStyle {
        fn foreground(&self) -> Option<Rgb> {
            None
        }
        fn background(&self) -> Option<Rgb> {
            None
        }
        fn compose(&self, other: &Self) -> Self {
            // The most specific (last-applied) kind wins the tag name; this
            // mirrors "apply a then wrap with b" collapsing to a single
            // visible tag for test fixtures.
            other.clone()
        }
        fn with_colors(&self, _fg: Option<Rgb>, _bg: Option<Rgb>) -> Self {
            self.clone()
        }
        fn apply(&self, text: &str) -> String {
            let tag = self.kind.tag_name();
            format!("<{tag}>{text}</{tag}>")
        }
    }
}
