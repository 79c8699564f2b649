//! Nested validation dispatch
//!
//! Routes an inlined column to the transformer of its inline form and
//! validates the flattened records with the nested model.

use tracing::{debug, warn};

use super::FrameValidationError;
use super::model::FrameModel;
use super::registry::ModelRegistry;
use super::transforms::{
    CollectionStructTransformer, ListStructTransformer, NestedStructTransformer, ShapeTransformer,
    SimpleDictTransformer,
};
use crate::frame::DataFrame;
use crate::generator::slot_classifier::RepresentationKind;

/// Runs the nested check of inlined columns
pub struct NestedDispatcher<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> NestedDispatcher<'a> {
    #[must_use]
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Validate the records held in `column` of `df`
    ///
    /// Returns `Ok(false)` when the column cannot be reshaped into records;
    /// such faults are logged, not raised.
    ///
    /// # Errors
    ///
    /// Returns the nested model's violations unchanged, or a configuration
    /// error if the nested model or its inline details are unknown
    pub fn check_column(
        &self,
        owner: &FrameModel,
        df: &DataFrame,
        column: &str,
        kind: RepresentationKind,
    ) -> Result<bool, FrameValidationError> {
        if !kind.is_nested() {
            return Ok(true);
        }

        let nested_name = owner.nested_range(column).ok_or_else(|| {
            FrameValidationError::UnknownModel(format!("{}.{column}", owner.name()))
        })?;
        let nested = self.registry.resolve(nested_name)?;

        let prepared = match kind {
            RepresentationKind::SimpleDict => {
                let details = owner.inline_details(column).ok_or_else(|| {
                    FrameValidationError::Configuration(format!(
                        "no inline details for simple dict column {}.{column}",
                        owner.name()
                    ))
                })?;
                SimpleDictTransformer::new(&nested, details).prepare(df, column)
            }
            RepresentationKind::CollectionStruct => {
                CollectionStructTransformer::new(&nested).prepare(df, column)
            }
            RepresentationKind::NestedListStruct => {
                ListStructTransformer::new(&nested).prepare(df, column)
            }
            RepresentationKind::NestedStruct => {
                NestedStructTransformer::new(&nested).prepare(df, column)
            }
            RepresentationKind::Reference => return Ok(true),
        };

        let flat = match prepared {
            Ok(flat) => flat,
            Err(fault) => {
                warn!(model = owner.name(), column, %kind, %fault, "nested column could not be reshaped");
                return Ok(false);
            }
        };
        if flat.height() == 0 {
            return Ok(true);
        }

        debug!(model = owner.name(), column, nested = nested.name(), rows = flat.height(), "validating nested records");
        match nested.validate(&flat, self.registry) {
            Ok(()) => Ok(true),
            Err(FrameValidationError::Reshape(fault)) => {
                warn!(model = nested.name(), %fault, "nested records could not be validated");
                Ok(false)
            }
            Err(other) => Err(other),
        }
    }
}
