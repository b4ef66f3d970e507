//! Types, signals, constants and subprograms declared in an architecture,
//! module or package.

use super::comments::{annotate_row, CommentAssociator};
use super::{
    flat_text, identifier_of, initial_value, listed_names, region_items, regions, type_prefix,
    ExtractContext,
};
use crate::error::{ExtractionError, Result};
use crate::ir::{
    ConstantDecl, DeclarationBlock, FunctionDecl, HdlLanguage, SignalDecl, SubprogramKind,
    TypeDecl,
};
use crate::parser::cst::{Node, SyntaxTree};
use crate::parser::profile::LanguageProfile;

/// Which unit's declarations to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionMode {
    /// The implementation of the entity: its architecture, or the module body.
    Architecture,
    Package,
}

/// Extract the declaration block of the selected region.
pub fn extract_declarations(
    tree: &SyntaxTree,
    mode: RegionMode,
    ctx: &ExtractContext<'_>,
) -> Result<DeclarationBlock> {
    let region = declarative_region(tree, mode, ctx.profile)?;
    let mut walk = DeclarationWalk {
        ctx,
        mode,
        assoc: ctx.associator(),
        block: DeclarationBlock::default(),
    };
    for item in region_items(region, ctx.profile) {
        walk.item(item);
    }
    Ok(walk.block)
}

fn declarative_region<'t>(
    tree: &'t SyntaxTree,
    mode: RegionMode,
    profile: &LanguageProfile,
) -> Result<Node<'t>> {
    const REGION: &str = "declarative";
    let (owner, kind) = match mode {
        RegionMode::Architecture => {
            let entity = regions::entity_name(tree, profile).unwrap_or_default();
            (
                regions::implementation(tree, profile, entity),
                profile.declarative_region,
            )
        }
        RegionMode::Package => (regions::find_package(tree, profile), profile.package_region),
    };
    let owner = owner.ok_or(ExtractionError::MalformedRegion { region: REGION })?;
    regions::region(owner, kind, REGION)
}

struct DeclarationWalk<'c, 'a> {
    ctx: &'c ExtractContext<'a>,
    mode: RegionMode,
    assoc: CommentAssociator<'a>,
    block: DeclarationBlock,
}

impl DeclarationWalk<'_, '_> {
    fn item(&mut self, node: Node<'_>) {
        let profile = self.ctx.profile;
        match (profile.language, node.kind()) {
            (_, kind) if profile.is_comment(kind) => self.comment(node),
            (HdlLanguage::Vhdl, "signal_declaration") => self.vhdl_object(node, true),
            (HdlLanguage::Vhdl, "constant_declaration") => self.vhdl_object(node, false),
            (HdlLanguage::Vhdl, "type_declaration" | "subtype_declaration") => self.vhdl_type(node),
            (HdlLanguage::Vhdl, "subprogram_declaration" | "subprogram_definition") => {
                self.vhdl_subprogram(node)
            }
            (HdlLanguage::Verilog, "data_declaration") => match node.child_by_kind("type_declaration") {
                Some(typedef) => self.verilog_type(typedef),
                None => self.verilog_variables(node, "list_of_variable_decl_assignments"),
            },
            (HdlLanguage::Verilog, "net_declaration") => {
                self.verilog_variables(node, "list_of_net_decl_assignments")
            }
            (HdlLanguage::Verilog, "local_parameter_declaration") => self.verilog_constants(node),
            (HdlLanguage::Verilog, kind)
                if self.mode == RegionMode::Package && profile.package_constants.contains(&kind) =>
            {
                self.verilog_constants(node)
            }
            (HdlLanguage::Verilog, "function_declaration") => {
                self.verilog_subroutine(node, SubprogramKind::Function)
            }
            (HdlLanguage::Verilog, "task_declaration") => {
                self.verilog_subroutine(node, SubprogramKind::Task)
            }
            _ if node.is_named() => self.assoc.interrupt(node),
            _ => {}
        }
    }

    fn comment(&mut self, node: Node<'_>) {
        let block = &mut self.block;
        self.assoc.comment(node, |row, text| {
            let hits = [
                annotate_row(&mut block.types, row, text),
                annotate_row(&mut block.signals, row, text),
                annotate_row(&mut block.constants, row, text),
                annotate_row(&mut block.functions, row, text),
            ];
            hits.contains(&true)
        });
    }

    fn push_type(&mut self, name: &str, type_definition: String, row: usize) {
        let description = self.assoc.take();
        self.block.types.push(TypeDecl {
            name: name.to_string(),
            type_definition,
            description,
            source_line: row,
        });
    }

    fn push_function(&mut self, name: String, kind: SubprogramKind, arguments: String, return_type: String, row: usize) {
        let description = self.assoc.take();
        self.block.functions.push(FunctionDecl {
            name,
            kind,
            arguments,
            return_type,
            description,
            source_line: row,
        });
    }

    // =========================================================================
    // VHDL
    // =========================================================================

    fn vhdl_object(&mut self, decl: Node<'_>, is_signal: bool) {
        let names = decl
            .child_by_kind("identifier_list")
            .map(listed_names)
            .unwrap_or_default();
        if names.is_empty() {
            self.assoc.interrupt(decl);
            return;
        }
        let type_name = decl
            .child_by_kind("subtype_indication")
            .map(flat_text)
            .unwrap_or_default();
        let default_value = initial_value(decl);
        let values = names
            .into_iter()
            .map(|name| (name.to_string(), default_value.clone()))
            .collect();
        self.push_objects(values, &type_name, decl.start_row(), is_signal);
    }

    /// `type t is (...)`, `type r is record ... end record` or `subtype s is ...`.
    fn vhdl_type(&mut self, decl: Node<'_>) {
        let Some(name) = identifier_of(decl) else {
            self.assoc.interrupt(decl);
            return;
        };
        let type_definition = decl
            .named_children()
            .find(|n| n.field_name() != Some("type") && !self.ctx.profile.is_comment(n.kind()))
            .map(flat_text)
            .unwrap_or_default();
        self.push_type(name, type_definition, decl.start_row());
    }

    fn vhdl_subprogram(&mut self, decl: Node<'_>) {
        let Some(spec) = decl.child_by_kinds(&["function_specification", "procedure_specification"])
        else {
            self.assoc.interrupt(decl);
            return;
        };
        let (kind, field) = if spec.kind() == "function_specification" {
            (SubprogramKind::Function, "function")
        } else {
            (SubprogramKind::Procedure, "procedure")
        };
        let name = spec
            .child_by_field(field)
            .map(|n| n.text())
            .unwrap_or_default();
        if name.is_empty() {
            self.assoc.interrupt(decl);
            return;
        }
        let arguments = spec
            .child_by_kind("parameter_list_specification")
            .map(flat_text)
            .unwrap_or_default();
        let return_type = spec
            .child_by_field("type")
            .map(flat_text)
            .unwrap_or_default();
        self.push_function(name.to_string(), kind, arguments, return_type, decl.start_row());
    }

    // =========================================================================
    // Verilog
    // =========================================================================

    fn verilog_variables(&mut self, decl: Node<'_>, list_kind: &str) {
        let values: Vec<(String, String)> = decl
            .child_by_kind(list_kind)
            .map(|list| {
                list.named_children()
                    .filter_map(|assignment| {
                        let name = assignment.child_by_kinds(self.ctx.profile.identifier_kinds)?;
                        let value = assignment
                            .child_by_kind("expression")
                            .map(flat_text)
                            .unwrap_or_default();
                        Some((name.text().to_string(), value))
                    })
                    .collect()
            })
            .unwrap_or_default();
        if values.is_empty() {
            self.assoc.interrupt(decl);
            return;
        }
        let type_name = type_prefix(decl, list_kind);
        self.push_objects(values, &type_name, decl.start_row(), true);
    }

    fn verilog_constants(&mut self, decl: Node<'_>) {
        let values: Vec<(String, String)> = decl
            .child_by_kind("list_of_param_assignments")
            .map(|list| {
                list.children_by_kind("param_assignment")
                    .filter_map(|assignment| {
                        let name = assignment.child_by_kind("parameter_identifier")?;
                        let value = assignment
                            .child_by_kind("constant_param_expression")
                            .map(flat_text)
                            .unwrap_or_default();
                        Some((name.text().to_string(), value))
                    })
                    .collect()
            })
            .unwrap_or_default();
        if values.is_empty() {
            self.assoc.interrupt(decl);
            return;
        }
        let type_name = decl
            .child_by_kind("data_type_or_implicit1")
            .map(flat_text)
            .unwrap_or_default();
        self.push_objects(values, &type_name, decl.start_row(), false);
    }

    /// `typedef <data_type> <name>;`
    fn verilog_type(&mut self, typedef: Node<'_>) {
        let Some(name) = typedef
            .children()
            .filter(|n| self.ctx.profile.identifier_kinds.contains(&n.kind()))
            .last()
        else {
            self.assoc.interrupt(typedef);
            return;
        };
        let type_definition = typedef
            .child_by_kind("data_type")
            .map(flat_text)
            .unwrap_or_default();
        self.push_type(name.text(), type_definition, typedef.start_row());
    }

    fn verilog_subroutine(&mut self, decl: Node<'_>, kind: SubprogramKind) {
        let (body_kind, name_kind) = match kind {
            SubprogramKind::Task => ("task_body_declaration", "task_identifier"),
            _ => ("function_body_declaration", "function_identifier"),
        };
        let body = decl.child_by_kind(body_kind).unwrap_or(decl);
        let name = body.child_by_kind(name_kind).map(flat_text).unwrap_or_default();
        if name.is_empty() {
            self.assoc.interrupt(decl);
            return;
        }
        let arguments = body
            .child_by_kind("tf_port_list")
            .map(|ports| format!("({})", flat_text(ports)))
            .unwrap_or_default();
        let return_type = body
            .child_by_kind("function_data_type_or_implicit1")
            .map(flat_text)
            .unwrap_or_default();
        self.push_function(name, kind, arguments, return_type, decl.start_row());
    }

    fn push_objects(&mut self, values: Vec<(String, String)>, type_name: &str, row: usize, is_signal: bool) {
        let description = self.assoc.take();
        for (name, default_value) in values.into_iter().filter(|(n, _)| !n.is_empty()) {
            if is_signal {
                self.block.signals.push(SignalDecl {
                    name,
                    type_name: type_name.to_string(),
                    default_value,
                    description: description.clone(),
                    source_line: row,
                });
            } else {
                self.block.constants.push(ConstantDecl {
                    name,
                    type_name: type_name.to_string(),
                    default_value,
                    description: description.clone(),
                    source_line: row,
                });
            }
        }
    }
}
