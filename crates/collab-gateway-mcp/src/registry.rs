// crates/collab-gateway-mcp/src/registry.rs
// ============================================================================
// Module: Tool Registry
// Description: Catalog of tool descriptors, handlers, and compiled schemas.
// Purpose: Register tools once at startup and serve read-only lookups after.
// Dependencies: jsonschema, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Tools are registered through a [`ToolRegistryBuilder`]; every check
//! (unique name, compilable schema, Organizer tools in the meeting category)
//! runs at registration so a bad catalog fails before any call is served.
//! [`ToolRegistryBuilder::build`] freezes the catalog into a [`ToolRegistry`]
//! that is shared by reference and never mutated again, so request tasks read
//! it without locking.
//!
//! Input schemas are compiled twice over: a root validator that checks the
//! object shape with every property schema relaxed to `true`, and one
//! validator per declared property. Violations from the per-property
//! validators are prefixed with the property name, so a failed validation
//! names every offending field.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use collab_gateway_core::PermissionLevel;
use jsonschema::Draft;
use jsonschema::Validator;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::tools::ToolHandler;

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Tool category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Not scoped to a team or meeting.
    General,
    /// Operates inside a team.
    Team,
    /// Operates on a meeting.
    Meeting,
}

impl ToolCategory {
    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Team => "team",
            Self::Meeting => "meeting",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable tool metadata as listed by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool arguments.
    pub input_schema: Value,
    /// Category tag.
    pub category: ToolCategory,
    /// Permission level required to call the tool.
    pub required_permission: PermissionLevel,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A tool with this name is already registered.
    #[error("tool already registered: {0}")]
    Duplicate(String),
    /// No tool is registered under this name.
    #[error("tool not found: {0}")]
    NotFound(String),
    /// An Organizer tool was registered outside the meeting category.
    #[error("tool {name} requires organizer but is in category {category}")]
    OrganizerOutsideMeeting {
        /// Tool name.
        name: String,
        /// Declared category.
        category: ToolCategory,
    },
    /// The input schema does not compile.
    #[error("tool {name} has an invalid input schema: {reason}")]
    InvalidSchema {
        /// Tool name.
        name: String,
        /// Compiler message.
        reason: String,
    },
}

// ============================================================================
// SECTION: Schema Validation
// ============================================================================

/// Input schema compiled for field-level reporting.
pub struct SchemaValidator {
    /// Object-shape validator with relaxed property schemas.
    root: Validator,
    /// One validator per declared property.
    properties: Vec<(String, Validator)>,
}

impl SchemaValidator {
    /// Compiles `schema`.
    ///
    /// # Errors
    ///
    /// Returns the compiler message when the schema (or one of its property
    /// schemas) is invalid.
    pub fn compile(schema: &Value) -> Result<Self, String> {
        let mut properties = Vec::new();
        let mut relaxed = schema.clone();
        if let Some(Value::Object(props)) = schema.get("properties") {
            for (name, property_schema) in props {
                let validator = compile_schema(property_schema)
                    .map_err(|err| format!("property {name}: {err}"))?;
                properties.push((name.clone(), validator));
            }
            let relaxed_props: Map<String, Value> =
                props.keys().map(|name| (name.clone(), Value::Bool(true))).collect();
            if let Value::Object(root) = &mut relaxed {
                root.insert("properties".to_string(), Value::Object(relaxed_props));
            }
        }
        let root = compile_schema(&relaxed)?;
        Ok(Self {
            root,
            properties,
        })
    }

    /// Returns every violation in `instance`; empty means valid.
    #[must_use]
    pub fn violations(&self, instance: &Value) -> Vec<String> {
        let mut violations: Vec<String> =
            self.root.iter_errors(instance).map(|err| err.to_string()).collect();
        if let Value::Object(fields) = instance {
            for (name, validator) in &self.properties {
                if let Some(value) = fields.get(name) {
                    violations.extend(
                        validator.iter_errors(value).map(|err| format!("{name}: {err}")),
                    );
                }
            }
        }
        violations
    }
}

/// Compiles a JSON schema for validation.
fn compile_schema(schema: &Value) -> Result<Validator, String> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|err| err.to_string())
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registered tool: descriptor, compiled schema, and handler.
pub struct RegisteredTool {
    /// Listed metadata.
    descriptor: ToolDescriptor,
    /// Compiled input schema.
    validator: SchemaValidator,
    /// Tool body.
    handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    /// Returns the descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Returns the compiled input schema.
    #[must_use]
    pub const fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Returns the tool body.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }
}

/// Mutable registry used during startup.
#[derive(Default)]
pub struct ToolRegistryBuilder {
    /// Tools by name.
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on a duplicate name, an Organizer tool
    /// outside the meeting category, or a schema that does not compile.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<&mut Self, RegistryError> {
        if self.tools.contains_key(&descriptor.name) {
            return Err(RegistryError::Duplicate(descriptor.name));
        }
        if descriptor.required_permission == PermissionLevel::Organizer
            && descriptor.category != ToolCategory::Meeting
        {
            return Err(RegistryError::OrganizerOutsideMeeting {
                name: descriptor.name,
                category: descriptor.category,
            });
        }
        let validator = SchemaValidator::compile(&descriptor.input_schema).map_err(|reason| {
            RegistryError::InvalidSchema {
                name: descriptor.name.clone(),
                reason,
            }
        })?;
        self.tools.insert(
            descriptor.name.clone(),
            RegisteredTool {
                descriptor,
                validator,
                handler,
            },
        );
        Ok(self)
    }

    /// Freezes the catalog.
    #[must_use]
    pub fn build(self) -> ToolRegistry {
        let listing = self.tools.values().map(|tool| tool.descriptor.clone()).collect();
        ToolRegistry {
            inner: Arc::new(RegistryInner {
                tools: self.tools,
                listing,
            }),
        }
    }
}

/// Frozen registry contents.
struct RegistryInner {
    /// Tools by name.
    tools: BTreeMap<String, RegisteredTool>,
    /// Descriptors in name order.
    listing: Vec<ToolDescriptor>,
}

/// Read-only tool registry.
///
/// # Invariants
/// - Tool names are unique.
/// - Contents never change after construction.
#[derive(Clone)]
pub struct ToolRegistry {
    /// Shared frozen contents.
    inner: Arc<RegistryInner>,
}

impl ToolRegistry {
    /// Returns an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        ToolRegistryBuilder::new().build()
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.inner.tools.get(name)
    }

    /// Looks up a tool by name, failing with a typed not-found.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no tool has this name.
    pub fn lookup(&self, name: &str) -> Result<&RegisteredTool, RegistryError> {
        self.get(name).ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Returns every descriptor in name order.
    #[must_use]
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.inner.listing
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.tools.len()
    }

    /// Returns true when no tool is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.tools.is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
