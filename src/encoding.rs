use std::fmt;

use anyhow::{Result, anyhow};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingSource {
    Override,
    Bom,
    AssumedUtf8,
    Detector,
}

impl fmt::Display for EncodingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EncodingSource::Override => "override",
            EncodingSource::Bom => "bom",
            EncodingSource::AssumedUtf8 => "assumed-utf8",
            EncodingSource::Detector => "detector",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct EncodingDecision {
    pub encoding: &'static Encoding,
    pub source: EncodingSource,
}

#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub had_errors: bool,
    pub decision: EncodingDecision,
}

/// Decoding policy for a whole run: either a fixed operator-chosen encoding
/// or auto-detection (BOM, then strict UTF-8, then chardetng).
#[derive(Debug, Clone)]
pub struct EncodingStrategy {
    override_encoding: Option<&'static Encoding>,
}

impl EncodingStrategy {
    pub fn new(override_label: Option<&str>) -> Result<Self> {
        let override_encoding = match override_label {
            Some(label) => {
                let trimmed = label.trim();
                let encoding = Encoding::for_label(trimmed.as_bytes())
                    .ok_or_else(|| anyhow!("unknown encoding override '{trimmed}'"))?;
                Some(encoding)
            }
            None => None,
        };
        Ok(Self { override_encoding })
    }

    pub fn decode(&self, bytes: &[u8]) -> DecodedText {
        let decision = match self.override_encoding {
            Some(encoding) => EncodingDecision {
                encoding,
                source: EncodingSource::Override,
            },
            None => sniff(bytes),
        };
        let (cow, _, had_errors) = decision.encoding.decode(bytes);
        DecodedText {
            text: cow.into_owned(),
            had_errors,
            decision,
        }
    }
}

fn sniff(bytes: &[u8]) -> EncodingDecision {
    if let Some(encoding) = bom_encoding(bytes) {
        return EncodingDecision {
            encoding,
            source: EncodingSource::Bom,
        };
    }

    if std::str::from_utf8(bytes).is_ok() {
        return EncodingDecision {
            encoding: UTF_8,
            source: EncodingSource::AssumedUtf8,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    EncodingDecision {
        encoding: detector.guess(None, true),
        source: EncodingSource::Detector,
    }
}

fn bom_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Some(UTF_8);
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Some(UTF_16LE);
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Some(UTF_16BE);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_override_label() {
        assert!(EncodingStrategy::new(Some("not-a-charset")).is_err());
    }

    #[test]
    fn override_wins_over_detection() {
        let strategy = EncodingStrategy::new(Some("utf-16le")).expect("valid label");
        let decoded = strategy.decode(&[0x61, 0x00]);
        assert_eq!(decoded.decision.source, EncodingSource::Override);
        assert_eq!(decoded.text, "a");
    }

    #[test]
    fn plain_utf8_is_assumed_without_bom() {
        let decision = sniff(b"hello world");
        assert_eq!(decision.source, EncodingSource::AssumedUtf8);
        assert_eq!(decision.encoding.name(), "UTF-8");
    }

    #[test]
    fn bom_takes_precedence() {
        let decision = sniff(&[0xFF, 0xFE, 0x61, 0x00]);
        assert_eq!(decision.source, EncodingSource::Bom);
        assert_eq!(decision.encoding.name(), "UTF-16LE");
    }
}
