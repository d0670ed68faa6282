//! Static meal menu and the `getMenuTool` lookup tool.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{Tool, ToolError};

/// Returned for categories that are not on the menu.
pub const MENU_NOT_FOUND: &str = "No menu was found for that category.";

/// Meal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCategory {
    Breakfast,
    Lunch,
    Dinner,
}

impl MenuCategory {
    pub const ALL: [MenuCategory; 3] = [MenuCategory::Breakfast, MenuCategory::Lunch, MenuCategory::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            MenuCategory::Breakfast => "breakfast",
            MenuCategory::Lunch => "lunch",
            MenuCategory::Dinner => "dinner",
        }
    }
}

impl FromStr for MenuCategory {
    type Err = ToolError;

    /// Case-insensitive, exact match. Surrounding whitespace is not ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MenuCategory::Breakfast),
            "lunch" => Ok(MenuCategory::Lunch),
            "dinner" => Ok(MenuCategory::Dinner),
            _ => Err(ToolError::InvalidArguments(format!("unknown menu category: {}", s))),
        }
    }
}

impl fmt::Display for MenuCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Today's menu, one fixed entry per category. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct MenuTable {
    entries: HashMap<MenuCategory, &'static str>,
}

impl Default for MenuTable {
    fn default() -> Self {
        Self {
            entries: HashMap::from([
                (MenuCategory::Breakfast, "Allo Paratha, Poha, Masala Chai"),
                (MenuCategory::Lunch, "Paneer Butter Masala, Dal Fry, Jeera Rice, Roti"),
                (MenuCategory::Dinner, "Veg Biryani, Raita, Salad, Gulab Jamun"),
            ]),
        }
    }
}

impl MenuTable {
    /// Menu for a known category.
    pub fn get(&self, category: MenuCategory) -> &'static str {
        self.entries.get(&category).copied().unwrap_or(MENU_NOT_FOUND)
    }

    /// Looks up a category string, case-insensitively.
    ///
    /// Unknown categories return [`MENU_NOT_FOUND`] rather than an error.
    pub fn lookup(&self, category: &str) -> &'static str {
        category
            .parse::<MenuCategory>()
            .map(|c| self.get(c))
            .unwrap_or(MENU_NOT_FOUND)
    }
}

#[derive(Debug, Deserialize)]
struct MenuArgs {
    category: String,
}

/// Tool exposing [`MenuTable::lookup`] to the agent.
#[derive(Debug, Clone, Default)]
pub struct MenuTool {
    table: MenuTable,
}

impl MenuTool {
    pub const NAME: &'static str = "getMenuTool";

    pub fn new(table: MenuTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl Tool for MenuTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Returns the final answer for today's menu for the given category (breakfast, lunch, or dinner)."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "description": "type of meal. Example: breakfast, lunch, dinner"
                }
            },
            "required": ["category"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let args: MenuArgs = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        Ok(self.table.lookup(&args.category).to_string())
    }
}
