use serde::Serialize;
use shelfcheck_core::{DateMatch, ExpiryDate, ExpiryEvaluator, ExtractionMiss};

/// Everything one scan produced, from raw OCR text to the extracted date.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    /// Raw OCR text output.
    pub ocr_text: String,
    /// OCR text after character repair.
    pub cleaned_text: String,
    #[serde(serialize_with = "serialize_extraction")]
    pub extraction: Result<DateMatch, ExtractionMiss>,
}

impl ScanOutcome {
    pub fn expiry_date(&self) -> Option<ExpiryDate> {
        self.extraction.as_ref().ok().map(|m| m.date)
    }

    /// `None` when no date was found; absence is never reported as "not expired".
    pub fn is_expired(&self) -> Option<bool> {
        self.expiry_date().map(|d| ExpiryEvaluator::is_expired(Some(d)))
    }
}

fn serialize_extraction<S: serde::Serializer>(
    extraction: &Result<DateMatch, ExtractionMiss>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    #[serde(rename_all = "snake_case")]
    enum Repr<'a> {
        Found(&'a DateMatch),
        Missing(String),
    }
    match extraction {
        Ok(m) => Repr::Found(m).serialize(serializer),
        Err(miss) => Repr::Missing(miss.to_string()).serialize(serializer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfcheck_core::DateFormat;

    fn outcome(extraction: Result<DateMatch, ExtractionMiss>) -> ScanOutcome {
        ScanOutcome { ocr_text: String::new(), cleaned_text: String::new(), extraction }
    }

    fn found(y: i32, m: u32, d: u32) -> Result<DateMatch, ExtractionMiss> {
        Ok(DateMatch {
            date: ExpiryDate::new(y, m, d).unwrap(),
            format: DateFormat::DayMonthYear,
            matched: format!("{d:02}/{m:02}/{y}"),
        })
    }

    #[test]
    fn missing_date_has_no_verdict() {
        let o = outcome(Err(ExtractionMiss::NoPatternMatch));
        assert_eq!(o.expiry_date(), None);
        assert_eq!(o.is_expired(), None);
    }

    #[test]
    fn verdict_for_found_dates() {
        assert_eq!(outcome(found(2001, 1, 1)).is_expired(), Some(true));
        assert_eq!(outcome(found(9999, 1, 1)).is_expired(), Some(false));
    }

    #[test]
    fn serializes_found_and_missing() {
        let json = serde_json::to_value(outcome(found(2024, 12, 31))).unwrap();
        assert_eq!(json["extraction"]["found"]["date"], "2024-12-31");
        assert_eq!(json["extraction"]["found"]["format"], "day_month_year");

        let json = serde_json::to_value(outcome(Err(ExtractionMiss::NoTextDetected))).unwrap();
        assert_eq!(json["extraction"]["missing"], "no text detected");
    }
}
