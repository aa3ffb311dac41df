//! Page labels from the catalog `/PageLabels` number tree.

/// Largest `/St` start number accepted from a document
pub const MAX_LABEL_START: u32 = 100_000;

/// Roman and alphabetic labels past this length are written as decimals
const MAX_LETTER_LABEL_LEN: usize = 32;

/// Numbering style of a label range (`/S`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Decimal,
    UpperRoman,
    LowerRoman,
    UpperAlpha,
    LowerAlpha,
}

impl LabelStyle {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "D" => Some(Self::Decimal),
            "R" => Some(Self::UpperRoman),
            "r" => Some(Self::LowerRoman),
            "A" => Some(Self::UpperAlpha),
            "a" => Some(Self::LowerAlpha),
            _ => None,
        }
    }
}

/// One entry of the number tree: labels from `start_index` (0-based page)
/// up to the next range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRange {
    pub start_index: usize,
    /// `None` means prefix only
    pub style: Option<LabelStyle>,
    pub prefix: String,
    pub first_number: u32,
}

impl LabelRange {
    pub fn decimal(start_index: usize) -> Self {
        Self {
            start_index,
            style: Some(LabelStyle::Decimal),
            prefix: String::new(),
            first_number: 1,
        }
    }
}

/// Expand ranges into one label per page. Pages before the first range get
/// empty labels.
pub fn build_labels(ranges: &[LabelRange], page_count: usize) -> Vec<String> {
    let mut sorted: Vec<&LabelRange> = ranges.iter().collect();
    sorted.sort_by_key(|r| r.start_index);

    let mut labels = vec![String::new(); page_count];
    for (i, range) in sorted.iter().enumerate() {
        let end = sorted
            .get(i + 1)
            .map_or(page_count, |next| next.start_index.min(page_count));
        let mut number = range.first_number.max(1);
        for label in labels.iter_mut().take(end).skip(range.start_index) {
            let mut text = range.prefix.clone();
            if let Some(style) = range.style {
                text.push_str(&format_number(style, number));
            }
            *label = text;
            number = number.saturating_add(1);
        }
    }
    labels
}

/// True when labels add nothing over plain page numbers.
pub fn is_standard_numbering(labels: &[String]) -> bool {
    labels
        .iter()
        .enumerate()
        .all(|(i, label)| *label == (i + 1).to_string())
}

fn format_number(style: LabelStyle, number: u32) -> String {
    let too_long = match style {
        LabelStyle::Decimal => false,
        LabelStyle::UpperRoman | LabelStyle::LowerRoman => {
            (number / 1000) as usize > MAX_LETTER_LABEL_LEN
        }
        LabelStyle::UpperAlpha | LabelStyle::LowerAlpha => {
            ((number - 1) / 26) as usize >= MAX_LETTER_LABEL_LEN
        }
    };
    if too_long {
        return number.to_string();
    }
    match style {
        LabelStyle::Decimal => number.to_string(),
        LabelStyle::UpperRoman => to_roman(number),
        LabelStyle::LowerRoman => to_roman(number).to_lowercase(),
        LabelStyle::UpperAlpha => to_alpha(number),
        LabelStyle::LowerAlpha => to_alpha(number).to_lowercase(),
    }
}

fn to_roman(mut number: u32) -> String {
    const NUMERALS: &[(u32, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for &(value, numeral) in NUMERALS {
        while number >= value {
            out.push_str(numeral);
            number -= value;
        }
    }
    out
}

/// A..Z, then AA..ZZ, AAA.. (letter repeated)
fn to_alpha(number: u32) -> String {
    let index = (number - 1) % 26;
    let repeat = (number - 1) / 26 + 1;
    let letter = char::from(b'A' + index as u8);
    std::iter::repeat_n(letter, repeat as usize).collect()
}
