use std::collections::HashSet;

use crate::error::PlanError;
use crate::money;

/// One orderable dish
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub name: String,
    /// Number of people one unit feeds
    pub serves: u32,
    pub price: f64,
    /// Whether a unit's servings count towards the vegan requirement
    #[cfg_attr(feature = "serde", serde(default, deserialize_with = "flag::deserialize"))]
    pub vegan: bool,
    /// Whether a unit's servings count towards the halal requirement
    #[cfg_attr(feature = "serde", serde(default, deserialize_with = "flag::deserialize"))]
    pub halal: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Vendor {
    pub name: String,
    /// Item order fixes the variable order of the vendor's model
    pub items: Vec<MenuItem>,
}

/// Every vendor considered in a run, in tie-break order
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub vendors: Vec<Vendor>,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, serves: u32, price: f64) -> Self {
        Self {
            name: name.into(),
            serves,
            price,
            vegan: false,
            halal: false,
        }
    }

    pub fn vegan(mut self) -> Self {
        self.vegan = true;
        self
    }

    pub fn halal(mut self) -> Self {
        self.halal = true;
        self
    }

    /// Price rounded to whole cents; `None` when the price is unusable.
    pub fn price_cents(&self) -> Option<u64> {
        money::to_cents(self.price)
    }
}

impl Vendor {
    pub fn new(name: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }

    /// Check item invariants: positive capacity, a finite non-negative price
    /// that fits in whole cents, unique names.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if item.serves == 0 {
                return Err(PlanError::ZeroCapacity {
                    vendor: self.name.clone(),
                    item: item.name.clone(),
                });
            }
            if item.price_cents().is_none() {
                return Err(PlanError::InvalidPrice {
                    vendor: self.name.clone(),
                    item: item.name.clone(),
                    price: item.price,
                });
            }
            if !seen.insert(item.name.as_str()) {
                return Err(PlanError::DuplicateItem {
                    vendor: self.name.clone(),
                    item: item.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Catalog {
    pub fn new(vendors: Vec<Vendor>) -> Self {
        Self { vendors }
    }

    /// Vendor names must be unique; item-level problems are left to each
    /// vendor so one bad menu does not hide the others.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut seen = HashSet::new();
        for vendor in &self.vendors {
            if !seen.insert(vendor.name.as_str()) {
                return Err(PlanError::DuplicateVendor(vendor.name.clone()));
            }
        }
        Ok(())
    }

    pub fn vendor(&self, name: &str) -> Option<&Vendor> {
        self.vendors.iter().find(|v| v.name == name)
    }

    pub fn item_count(&self) -> usize {
        self.vendors.iter().map(|v| v.items.len()).sum()
    }

    /// Built-in demonstration catalog of four restaurants.
    pub fn sample() -> Self {
        Self::new(vec![
            Vendor::new(
                "Thai House",
                vec![
                    MenuItem::new("Veggie Stir Fry", 2, 18.0).vegan(),
                    MenuItem::new("Green Curry", 3, 28.0).vegan(),
                    MenuItem::new("Chicken Satay", 2, 22.0).halal(),
                    MenuItem::new("Pad Thai", 2, 20.0),
                    MenuItem::new("Fried Rice", 3, 24.0),
                    MenuItem::new("Mango Sticky Rice", 2, 15.0).vegan(),
                ],
            ),
            Vendor::new(
                "Lebanese Grill",
                vec![
                    MenuItem::new("Falafel Plate", 3, 25.0).vegan().halal(),
                    MenuItem::new("Shawarma Platter", 4, 45.0).halal(),
                    MenuItem::new("Tabbouleh", 2, 18.0).vegan().halal(),
                    MenuItem::new("Mixed Grill", 4, 55.0).halal(),
                    MenuItem::new("Baklava Tray", 3, 20.0).halal(),
                    MenuItem::new("Hummus Bowl", 2, 15.0).vegan().halal(),
                ],
            ),
            Vendor::new(
                "Greek Taverna",
                vec![
                    MenuItem::new("Spanakopita", 2, 22.0),
                    MenuItem::new("Greek Salad", 3, 20.0).vegan(),
                    MenuItem::new("Lamb Gyro", 3, 35.0).halal(),
                    MenuItem::new("Dolmades", 2, 18.0).vegan(),
                    MenuItem::new("Moussaka", 4, 40.0),
                    MenuItem::new("Baklava", 3, 18.0),
                ],
            ),
            Vendor::new(
                "Chinese Kitchen",
                vec![
                    MenuItem::new("Wonton Soup", 2, 12.0),
                    MenuItem::new("Mapo Tofu", 2, 22.0).vegan(),
                    MenuItem::new("Sweet & Sour Chicken", 3, 28.0),
                    MenuItem::new("Vegetable Dumplings", 2, 16.0).vegan(),
                    MenuItem::new("Beef Stir Fry", 3, 30.0),
                    MenuItem::new("Fried Rice", 3, 20.0),
                ],
            ),
        ])
    }
}

/// Dietary flags are accepted as booleans or as the integers 0 and 1.
#[cfg(feature = "serde")]
mod flag {
    use serde::de::{self, Deserializer, Unexpected, Visitor};
    use std::fmt;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlagVisitor)
    }

    struct FlagVisitor;

    impl Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean or 0/1")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Unsigned(v), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Signed(v), &self)),
            }
        }
    }
}
