use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Hardware description language of a source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HdlLanguage {
    #[default]
    Vhdl,
    Verilog,
}

impl HdlLanguage {
    pub fn name(&self) -> &'static str {
        match self {
            HdlLanguage::Vhdl => "vhdl",
            HdlLanguage::Verilog => "verilog",
        }
    }

    /// Guess the dialect from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "vhd" | "vhdl" | "vho" | "vht" => Some(HdlLanguage::Vhdl),
            "v" | "vh" | "sv" | "svh" | "vlog" => Some(HdlLanguage::Verilog),
            _ => None,
        }
    }
}

impl fmt::Display for HdlLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HdlLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vhdl" | "vhd" => Ok(HdlLanguage::Vhdl),
            "verilog" | "v" | "systemverilog" | "sv" => Ok(HdlLanguage::Verilog),
            other => Err(format!("unknown HDL language: {}", other)),
        }
    }
}

/// Result of classifying one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "lowercase")]
pub enum CompilationUnit {
    Entity(EntityDocument),
    Package(PackageDocument),
}

impl CompilationUnit {
    pub fn name(&self) -> &str {
        match self {
            CompilationUnit::Entity(doc) => &doc.entity.name,
            CompilationUnit::Package(doc) => &doc.package.name,
        }
    }

    pub fn kind(&self) -> UnitKind {
        match self {
            CompilationUnit::Entity(_) => UnitKind::Entity,
            CompilationUnit::Package(_) => UnitKind::Package,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityDocument> {
        match self {
            CompilationUnit::Entity(doc) => Some(doc),
            CompilationUnit::Package(_) => None,
        }
    }

    pub fn as_package(&self) -> Option<&PackageDocument> {
        match self {
            CompilationUnit::Package(doc) => Some(doc),
            CompilationUnit::Entity(_) => None,
        }
    }

    pub fn declarations(&self) -> &DeclarationBlock {
        match self {
            CompilationUnit::Entity(doc) => &doc.declarations,
            CompilationUnit::Package(doc) => &doc.declarations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Entity,
    Package,
}

/// Name and kind of the primary unit, without the rest of the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitName {
    pub name: String,
    pub kind: UnitKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDocument {
    pub language: HdlLanguage,
    pub entity: EntityModel,
    pub declarations: DeclarationBlock,
    pub body: ArchitectureBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDocument {
    pub language: HdlLanguage,
    pub package: PackageModel,
    pub declarations: DeclarationBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityModel {
    pub name: String,
    pub description: String,
    /// `@author`, `@version` and similar tags lifted out of the description.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub info: IndexMap<String, String>,
    pub generics: Vec<Generic>,
    pub ports: Vec<Port>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub virtual_buses: Vec<VirtualBus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageModel {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub info: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generic {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    pub default_value: String,
    /// Zero-based source row of the declaration.
    pub source_line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    /// Lower-case mode (`in`, `out`, `inout`, ...), empty when unspecified.
    pub direction: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    pub default_value: String,
    /// Name of the `@portgroup` the port was declared under.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    pub source_line: usize,
}

/// Ports declared between `@virtualbus` and `@end`, documented as one bus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualBus {
    pub name: String,
    pub direction: String,
    pub description: String,
    /// Member port names in declaration order.
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationBlock {
    pub types: Vec<TypeDecl>,
    pub signals: Vec<SignalDecl>,
    pub constants: Vec<ConstantDecl>,
    pub functions: Vec<FunctionDecl>,
}

impl DeclarationBlock {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.signals.is_empty()
            && self.constants.is_empty()
            && self.functions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub type_definition: String,
    pub description: String,
    pub source_line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub default_value: String,
    pub description: String,
    pub source_line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub default_value: String,
    pub description: String,
    pub source_line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubprogramKind {
    #[default]
    Function,
    Procedure,
    Task,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub kind: SubprogramKind,
    pub arguments: String,
    pub return_type: String,
    pub description: String,
    pub source_line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureBody {
    pub processes: Vec<Process>,
    pub instantiations: Vec<Instantiation>,
}

impl ArchitectureBody {
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty() && self.instantiations.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub name: String,
    pub sensitivity_list: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_machine: Option<StateMachineGraph>,
    pub source_line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instantiation {
    pub name: String,
    pub instantiated_unit: String,
    pub description: String,
    pub source_line: usize,
}

/// State-transition graph recovered from a clocked process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMachineGraph {
    /// Text of the case selector, empty when unknown.
    pub state_signal: String,
    pub states: IndexSet<String>,
    pub initial_state: Option<String>,
    pub transitions: Vec<Transition>,
}

impl StateMachineGraph {
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.transitions.is_empty()
    }

    pub fn transitions_from<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a Transition> + 'a {
        self.transitions.iter().filter(move |t| t.from == state)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub guard_label: String,
}

impl Transition {
    pub fn new(from: impl Into<String>, to: impl Into<String>, guard_label: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            guard_label: guard_label.into(),
        }
    }

    pub fn is_loop(&self) -> bool {
        self.from == self.to
    }
}
