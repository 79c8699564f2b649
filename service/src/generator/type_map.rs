//! XSD type URI mapping for each output template

use linkml_core::TemplateKind;

use polars::prelude::{DataType, TimeUnit};

/// Primitive column types reachable from `LinkML` type URIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    NormalizedString,
    Integer,
    Int,
    Float,
    Double,
    Boolean,
    DateTime,
    Date,
    Time,
    AnyUri,
    Decimal,
}

impl PrimitiveType {
    /// Map a type URI (`xsd:` CURIE or full XML Schema URI)
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        let local = uri
            .strip_prefix("xsd:")
            .or_else(|| uri.strip_prefix("http://www.w3.org/2001/XMLSchema#"))?;

        Some(match local {
            "string" => Self::String,
            "normalizedString" => Self::NormalizedString,
            "integer" => Self::Integer,
            "int" => Self::Int,
            "float" => Self::Float,
            "double" => Self::Double,
            "boolean" => Self::Boolean,
            "dateTime" => Self::DateTime,
            "date" => Self::Date,
            "time" => Self::Time,
            "anyURI" => Self::AnyUri,
            "decimal" => Self::Decimal,
            _ => return None,
        })
    }

    /// The column type validated at runtime
    #[must_use]
    pub fn data_type(self) -> DataType {
        match self {
            Self::String | Self::NormalizedString | Self::AnyUri => DataType::String,
            Self::Integer => DataType::Int64,
            Self::Int => DataType::Int32,
            Self::Float => DataType::Float32,
            Self::Double => DataType::Float64,
            Self::Boolean => DataType::Boolean,
            Self::DateTime => DataType::Datetime(TimeUnit::Microseconds, None),
            Self::Date => DataType::Date,
            Self::Time => DataType::Time,
            // held as a double; polars decimals need a fixed scale
            Self::Decimal => DataType::Float64,
        }
    }

    /// Python type name for the given template
    #[must_use]
    pub fn python_name(self, template: TemplateKind) -> &'static str {
        match template {
            TemplateKind::ClassBased => self.class_based_name(),
            TemplateKind::PolarsSchema => self.polars_name(),
            TemplateKind::ArrowSchema => self.arrow_name(),
        }
    }

    /// Annotation used in `DataFrameModel` fields
    #[must_use]
    pub fn class_based_name(self) -> &'static str {
        match self {
            Self::String | Self::NormalizedString | Self::AnyUri => "str",
            Self::Integer | Self::Int => "int",
            Self::Float | Self::Double | Self::Decimal => "float",
            Self::Boolean => "bool",
            Self::DateTime => "DateTime",
            Self::Date => "Date",
            Self::Time => "Time",
        }
    }

    /// `polars` data type expression
    #[must_use]
    pub fn polars_name(self) -> &'static str {
        match self {
            Self::String | Self::NormalizedString | Self::AnyUri => "pl.Utf8",
            Self::Integer => "pl.Int64",
            Self::Int => "pl.Int32",
            Self::Float => "pl.Float32",
            Self::Double => "pl.Float64",
            Self::Boolean => "pl.Boolean",
            Self::DateTime => "pl.Datetime",
            Self::Date => "pl.Date",
            Self::Time => "pl.Time",
            Self::Decimal => "pl.Decimal",
        }
    }

    /// `pyarrow` data type expression
    #[must_use]
    pub fn arrow_name(self) -> &'static str {
        match self {
            Self::String | Self::NormalizedString | Self::AnyUri => "pa.string()",
            Self::Integer => "pa.int64()",
            Self::Int => "pa.int32()",
            Self::Float => "pa.float32()",
            Self::Double => "pa.float64()",
            Self::Boolean => "pa.bool_()",
            Self::DateTime => "pa.timestamp(\"us\")",
            Self::Date => "pa.date64()",
            Self::Time => "pa.time64(\"us\")",
            Self::Decimal => "pa.decimal128(38, 9)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_lookup() {
        assert_eq!(PrimitiveType::from_uri("xsd:dateTime"), Some(PrimitiveType::DateTime));
        assert_eq!(
            PrimitiveType::from_uri("http://www.w3.org/2001/XMLSchema#int"),
            Some(PrimitiveType::Int)
        );
        assert_eq!(PrimitiveType::from_uri("linkml:DateOrDatetime"), None);
        assert_eq!(PrimitiveType::from_uri("xsd:gYear"), None);
    }

    #[test]
    fn test_template_names() {
        let integer = PrimitiveType::Integer;
        assert_eq!(integer.python_name(TemplateKind::ClassBased), "int");
        assert_eq!(integer.python_name(TemplateKind::PolarsSchema), "pl.Int64");
        assert_eq!(integer.python_name(TemplateKind::ArrowSchema), "pa.int64()");
        assert_eq!(PrimitiveType::Int.data_type(), DataType::Int32);
    }
}
