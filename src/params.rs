use serde::Deserialize;

use crate::error::ResizeError;

/// Encodings the endpoint can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Case-insensitive; an empty value means the default (jpeg).
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return Some(Self::default());
        }
        match s.to_ascii_lowercase().as_str() {
            "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Raw text form values, first occurrence of each name.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FormFields {
    pub width: Option<String>,
    pub height: Option<String>,
    pub quality: Option<String>,
    pub format: Option<String>,
}

impl FormFields {
    /// Fills fields missing from `self` with values from `fallback`.
    pub fn or(self, fallback: FormFields) -> FormFields {
        FormFields {
            width: self.width.or(fallback.width),
            height: self.height.or(fallback.height),
            quality: self.quality.or(fallback.quality),
            format: self.format.or(fallback.format),
        }
    }
}

/// Validated parameters for one resize. Dimensions are never zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
    pub quality: u32,
    pub format: OutputFormat,
}

impl ResizeRequest {
    /// Checks width, height, quality, then format, failing on the first bad one.
    pub fn from_fields(fields: &FormFields) -> Result<Self, ResizeError> {
        let width = parse_u32(fields.width.as_deref())
            .filter(|w| *w > 0)
            .ok_or(ResizeError::InvalidWidth)?;
        let height = parse_u32(fields.height.as_deref())
            .filter(|h| *h > 0)
            .ok_or(ResizeError::InvalidHeight)?;
        let quality = parse_u32(fields.quality.as_deref()).ok_or(ResizeError::InvalidQuality)?;
        let format = OutputFormat::parse(fields.format.as_deref().unwrap_or_default())
            .ok_or(ResizeError::InvalidFormat)?;

        Ok(Self { width, height, quality, format })
    }

    /// Output pixel count must stay within `max_pixels`; the resampler
    /// allocates per output pixel and an allocation failure aborts.
    pub fn check_output_size(&self, max_pixels: u64) -> Result<(), ResizeError> {
        if u64::from(self.width) * u64::from(self.height) > max_pixels {
            return Err(ResizeError::TooManyPixels { width: self.width, height: self.height });
        }
        Ok(())
    }
}

/// Plain base-10 digits only: no sign, no whitespace, must fit in a u32.
fn parse_u32(raw: Option<&str>) -> Option<u32> {
    let s = raw?;
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(w: &str, h: &str, q: &str, f: Option<&str>) -> FormFields {
        FormFields {
            width: Some(w.into()),
            height: Some(h.into()),
            quality: Some(q.into()),
            format: f.map(Into::into),
        }
    }

    #[test]
    fn format_parsing() {
        assert_eq!(OutputFormat::parse("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::parse("JPEG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::parse("Png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::parse(""), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::parse("jpg"), None);
        assert_eq!(OutputFormat::parse("bmp"), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(OutputFormat::Jpeg.content_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.content_type(), "image/png");
    }

    #[test]
    fn valid_request() {
        let req = ResizeRequest::from_fields(&fields("50", "40", "90", Some("png"))).unwrap();
        assert_eq!(
            req,
            ResizeRequest { width: 50, height: 40, quality: 90, format: OutputFormat::Png }
        );
    }

    #[test]
    fn missing_format_defaults_to_jpeg() {
        let req = ResizeRequest::from_fields(&fields("1", "1", "0", None)).unwrap();
        assert_eq!(req.format, OutputFormat::Jpeg);
        assert_eq!(req.quality, 0);
    }

    #[test]
    fn numbers_are_strict() {
        assert_eq!(parse_u32(Some("4294967295")), Some(u32::MAX));
        assert_eq!(parse_u32(Some("4294967296")), None);
        assert_eq!(parse_u32(Some("+5")), None);
        assert_eq!(parse_u32(Some("-5")), None);
        assert_eq!(parse_u32(Some(" 5")), None);
        assert_eq!(parse_u32(Some("")), None);
        assert_eq!(parse_u32(None), None);
    }

    #[test]
    fn first_bad_field_wins() {
        let err = ResizeRequest::from_fields(&fields("abc", "x", "y", Some("bmp"))).unwrap_err();
        assert!(matches!(err, ResizeError::InvalidWidth));

        let err = ResizeRequest::from_fields(&fields("10", "x", "y", None)).unwrap_err();
        assert!(matches!(err, ResizeError::InvalidHeight));

        let mut missing_quality = fields("10", "10", "", None);
        missing_quality.quality = None;
        let err = ResizeRequest::from_fields(&missing_quality).unwrap_err();
        assert!(matches!(err, ResizeError::InvalidQuality));

        let err = ResizeRequest::from_fields(&fields("10", "10", "90", Some("bmp"))).unwrap_err();
        assert!(matches!(err, ResizeError::InvalidFormat));
    }

    #[test]
    fn output_pixel_cap() {
        let req = ResizeRequest::from_fields(&fields("10000", "10000", "90", None)).unwrap();
        assert!(req.check_output_size(100_000_000).is_ok());
        assert!(matches!(
            req.check_output_size(99_999_999),
            Err(ResizeError::TooManyPixels { width: 10000, height: 10000 })
        ));

        let huge = ResizeRequest::from_fields(&fields("4294967295", "4294967295", "90", None)).unwrap();
        assert!(huge.check_output_size(u64::MAX - 1).is_ok());
        assert!(huge.check_output_size(100_000_000).is_err());
    }

    #[test]
    fn body_fields_take_precedence_over_fallback() {
        let body = FormFields { width: Some("5".into()), ..FormFields::default() };
        let query = fields("50", "60", "70", Some("png"));
        let merged = body.or(query);
        assert_eq!(merged.width.as_deref(), Some("5"));
        assert_eq!(merged.height.as_deref(), Some("60"));
        assert_eq!(merged.quality.as_deref(), Some("70"));
        assert_eq!(merged.format.as_deref(), Some("png"));
    }

    #[test]
    fn zero_dimensions_rejected() {
        let err = ResizeRequest::from_fields(&fields("0", "10", "90", None)).unwrap_err();
        assert!(matches!(err, ResizeError::InvalidWidth));
        let err = ResizeRequest::from_fields(&fields("10", "0", "90", None)).unwrap_err();
        assert!(matches!(err, ResizeError::InvalidHeight));
    }
}
