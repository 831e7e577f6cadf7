//! Product attribute definitions
//!
//! The field list and its order are part of the output contract: every
//! summary file lists exactly these fields, in this order.

use std::fmt;

/// Rendered value of a field that was never set
pub const NOT_AVAILABLE: &str = "N/A";

/// The fixed set of product attributes extracted from a detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Public list price, formatted as `$ 0.00`
    ListPrice,

    /// Stock quantity shown on the page
    QuantityAvailable,

    /// Manufacturer name
    Manufacturer,

    /// Manufacturer part code
    ManufacturerNumber,

    /// The site's own catalog code
    PartsTownNumber,

    /// Unit of sale
    Units,

    /// Equipment models the part fits
    FitsModels,

    /// Regulatory (Prop 65) notice
    CaliforniaResidents,
}

impl Field {
    /// Every field, in output order
    pub const ALL: [Field; 8] = [
        Field::ListPrice,
        Field::QuantityAvailable,
        Field::Manufacturer,
        Field::ManufacturerNumber,
        Field::PartsTownNumber,
        Field::Units,
        Field::FitsModels,
        Field::CaliforniaResidents,
    ];

    /// The field name as written in the summary file
    pub fn label(&self) -> &'static str {
        match self {
            Self::ListPrice => "List Price",
            Self::QuantityAvailable => "Quantity Available",
            Self::Manufacturer => "Manufacturer",
            Self::ManufacturerNumber => "Manufacturer #",
            Self::PartsTownNumber => "Parts Town #",
            Self::Units => "Units",
            Self::FitsModels => "Fits Models",
            Self::CaliforniaResidents => "California Residents",
        }
    }

    /// Looks a field up by its summary label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.label() == label)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Attribute values for one product, keyed by [`Field`]
///
/// Values are write-once: the first non-empty value assigned to a field wins
/// and later assignments are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRecord {
    values: [Option<String>; 8],
}

impl AttributeRecord {
    /// Creates a record with every field unset
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a field, if it was set
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values[field.index()].as_deref()
    }

    /// Returns true if the field already holds a value
    pub fn is_set(&self, field: Field) -> bool {
        self.values[field.index()].is_some()
    }

    /// Assigns a value unless the field is already set
    ///
    /// Blank values are ignored. Returns true if the value was stored.
    pub fn set_if_absent(&mut self, field: Field, value: impl Into<String>) -> bool {
        let slot = &mut self.values[field.index()];
        if slot.is_some() {
            return false;
        }

        let value = value.into();
        let value = value.trim();
        if value.is_empty() {
            return false;
        }

        *slot = Some(value.to_string());
        true
    }

    /// Returns the value to print for a field (`N/A` when unset)
    pub fn display_value(&self, field: Field) -> &str {
        self.get(field).unwrap_or(NOT_AVAILABLE)
    }

    /// Iterates over every field in output order with its value
    pub fn iter(&self) -> impl Iterator<Item = (Field, Option<&str>)> + '_ {
        Field::ALL.into_iter().map(move |field| (field, self.get(field)))
    }

    /// Number of fields holding a value
    pub fn filled_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}
