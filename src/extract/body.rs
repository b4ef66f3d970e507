//! Processes and instantiations of an architecture or module body.

use super::comments::{annotate_row, CommentAssociator};
use super::{flat_text, label_of, region_items, regions, ExtractContext};
use crate::constants::UNNAMED;
use crate::error::{ExtractionError, Result};
use crate::fsm;
use crate::ir::{ArchitectureBody, Instantiation, Process};
use crate::parser::cst::{Node, SyntaxTree};
use crate::utils::{collapse_whitespace, strip_marker};

const REGION: &str = "concurrent statement";

/// Statement wrappers between an `always` keyword and its timing control or block.
const STATEMENT_WRAPPERS: &[&str] = &[
    "statement",
    "statement_item",
    "procedural_timing_control_statement",
    "statement_or_null",
];

/// Extract the concurrent statements implementing `entity_name`.
pub fn extract_body(
    tree: &SyntaxTree,
    entity_name: &str,
    ctx: &ExtractContext<'_>,
) -> Result<ArchitectureBody> {
    let owner = regions::implementation(tree, ctx.profile, entity_name)
        .ok_or(ExtractionError::MalformedRegion { region: REGION })?;
    let region = regions::region(owner, ctx.profile.concurrent_region, REGION)?;

    let mut walk = BodyWalk {
        ctx,
        assoc: ctx.associator(),
        body: ArchitectureBody::default(),
    };
    walk.region(region);
    Ok(walk.body)
}

struct BodyWalk<'c, 'a> {
    ctx: &'c ExtractContext<'a>,
    assoc: CommentAssociator<'a>,
    body: ArchitectureBody,
}

impl BodyWalk<'_, '_> {
    fn region(&mut self, region: Node<'_>) {
        let profile = self.ctx.profile;
        for child in region_items(region, profile) {
            match child.kind() {
                kind if profile.is_comment(kind) => self.comment(child),
                kind if profile.process_kinds.contains(&kind) => self.process(child),
                "component_instantiation_statement" => self.vhdl_instance(child),
                "module_instantiation" | "interface_instantiation" => self.verilog_instances(child),
                // generate/endgenerate only groups module items
                "generate_region" => self.region(child),
                _ if child.is_named() => self.assoc.interrupt(child),
                _ => {}
            }
        }
    }

    fn comment(&mut self, node: Node<'_>) {
        let body = &mut self.body;
        self.assoc.comment(node, |row, text| {
            let process_hit = annotate_row(&mut body.processes, row, text);
            let instance_hit = annotate_row(&mut body.instantiations, row, text);
            process_hit || instance_hit
        });
    }

    fn process(&mut self, node: Node<'_>) {
        let (description, marked) = strip_marker(&self.assoc.take(), self.ctx.fsm_marker);
        let state_machine = marked.then(|| fsm::extract_fsm(node, self.ctx.profile, self.ctx.fsm));
        self.body.processes.push(Process {
            name: process_name(node).to_string(),
            sensitivity_list: sensitivity_list(node),
            description,
            state_machine,
            source_line: node.start_row(),
        });
    }

    fn vhdl_instance(&mut self, node: Node<'_>) {
        let unit = match node.child_by_kind("instantiated_unit") {
            Some(unit) => instantiated_unit(unit),
            None => node
                .child_by_field("component")
                .map(flat_text)
                .unwrap_or_default(),
        };
        let description = self.assoc.take();
        self.body.instantiations.push(Instantiation {
            name: label_of(node).unwrap_or(UNNAMED).to_string(),
            instantiated_unit: unit,
            description,
            source_line: node.start_row(),
        });
    }

    /// `sub u_a (...), u_b (...);` documents every instance it declares.
    fn verilog_instances(&mut self, node: Node<'_>) {
        let unit = node
            .named_children()
            .next()
            .map(flat_text)
            .unwrap_or_default();
        let description = self.assoc.take();
        for instance in node.children_by_kind("hierarchical_instance") {
            let name = instance
                .child_by_kind("name_of_instance")
                .map(flat_text)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNNAMED.to_string());
            self.body.instantiations.push(Instantiation {
                name,
                instantiated_unit: unit.clone(),
                description: description.clone(),
                source_line: instance.start_row(),
            });
        }
    }
}

/// First node of `kind` reached from `node` through statement wrappers only.
fn through_wrappers<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    node.named_children().find_map(|child| {
        if child.kind() == kind {
            Some(child)
        } else if STATEMENT_WRAPPERS.contains(&child.kind()) {
            through_wrappers(child, kind)
        } else {
            None
        }
    })
}

fn process_name<'t>(node: Node<'t>) -> &'t str {
    label_of(node)
        .or_else(|| {
            through_wrappers(node, "seq_block")
                .and_then(|block| block.child_by_kind("simple_identifier"))
                .map(|label| label.text())
        })
        .unwrap_or(UNNAMED)
}

fn sensitivity_list(node: Node<'_>) -> String {
    if let Some(spec) = node.child_by_kind("sensitivity_specification") {
        let text = flat_text(spec);
        return text
            .trim_start_matches('(')
            .trim_end_matches(')')
            .trim()
            .to_string();
    }
    through_wrappers(node, "event_control")
        .and_then(|event| event.child_by_kind("event_expression"))
        .map(flat_text)
        .unwrap_or_default()
}

/// Unit named by an `instantiated_unit`. A leading `entity` keyword is
/// dropped; `component` and `configuration` stay as written.
fn instantiated_unit(node: Node<'_>) -> String {
    let text = collapse_whitespace(node.text());
    match text.split_once(' ') {
        Some((keyword, rest)) if keyword.eq_ignore_ascii_case("entity") => rest.to_string(),
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::HdlLanguage;
    use crate::parser::grammar;
    use std::sync::Arc;

    const VHDL_SOURCE: &str = "\
entity top is end;
architecture rtl of top is
begin
  --! Register stage
  reg_p : process (clk, rst)
  begin
  end process;

  process (all) begin end process; --! Combinational

  --! Submodule
  u_sub : entity work.sub(rtl) port map (a => b);
  -- plain comment
  comp : adder port map (x, y);
  cbar : component bar port map (x);
  cfg_i : configuration work.cfg;
end architecture;
";

    fn parse(language: HdlLanguage, source: &str) -> Arc<SyntaxTree> {
        grammar::load(language).unwrap().parse(source).unwrap()
    }

    fn vhdl_body(source: &str, entity: &str) -> ArchitectureBody {
        let tree = parse(HdlLanguage::Vhdl, source);
        extract_body(&tree, entity, &ExtractContext::new(HdlLanguage::Vhdl, "!")).unwrap()
    }

    #[test]
    fn test_vhdl_processes() {
        let body = vhdl_body(VHDL_SOURCE, "top");
        assert_eq!(body.processes.len(), 2);
        assert_eq!(body.processes[0].name, "reg_p");
        assert_eq!(body.processes[0].sensitivity_list, "clk, rst");
        assert_eq!(body.processes[0].description, "Register stage");
        assert_eq!(body.processes[0].source_line, 4);
        assert!(body.processes[0].state_machine.is_none());
        assert_eq!(body.processes[1].name, "unnamed");
        assert_eq!(body.processes[1].sensitivity_list, "all");
        assert_eq!(body.processes[1].description, "Combinational");
    }

    #[test]
    fn test_vhdl_instantiations() {
        let body = vhdl_body(VHDL_SOURCE, "top");
        let units: Vec<(&str, &str)> = body
            .instantiations
            .iter()
            .map(|i| (i.name.as_str(), i.instantiated_unit.as_str()))
            .collect();
        assert_eq!(
            units,
            vec![
                ("u_sub", "work.sub(rtl)"),
                ("comp", "adder"),
                ("cbar", "component bar"),
                ("cfg_i", "configuration work.cfg")
            ]
        );
        assert_eq!(body.instantiations[0].description, "Submodule");
        assert_eq!(body.instantiations[1].description, "");
    }

    #[test]
    fn test_concurrent_assignment_drops_pending_doc() {
        let body = vhdl_body(
            "\
entity top is end;
architecture rtl of top is
begin
  --! doc
  y <= '1';
  p2 : process begin wait; end process;
end architecture;
",
            "top",
        );
        assert_eq!(body.processes.len(), 1);
        assert_eq!(body.processes[0].name, "p2");
        assert_eq!(body.processes[0].sensitivity_list, "");
        assert_eq!(body.processes[0].description, "");
    }

    #[test]
    fn test_fsm_marker_is_stripped() {
        let body = vhdl_body(
            "\
entity e is end;
architecture a of e is
begin
  --! fsm_extract
  --! Controller
  ctrl : process (clk)
  begin
    case state is
      when A => state <= B;
      when B => state <= A;
    end case;
  end process;
end;
",
            "e",
        );
        let process = &body.processes[0];
        assert_eq!(process.description, "Controller");
        let graph = process.state_machine.as_ref().unwrap();
        assert_eq!(graph.states.len(), 2);
        assert_eq!(graph.transitions.len(), 2);
    }

    #[test]
    fn test_verilog_body() {
        let source = "\
module top;
  //! Main register
  always @(posedge clk or negedge rst_n) begin : seq
  end
  always_comb begin
  end
  generate
    //! Lanes
    lane #(.W(4)) l0 (.a(a)), l1 (.a(b));
  endgenerate
endmodule
";
        let tree = parse(HdlLanguage::Verilog, source);
        let ctx = ExtractContext::new(HdlLanguage::Verilog, "!");
        let body = extract_body(&tree, "top", &ctx).unwrap();
        assert_eq!(body.processes.len(), 2);
        assert_eq!(body.processes[0].name, "seq");
        assert_eq!(body.processes[0].sensitivity_list, "posedge clk or negedge rst_n");
        assert_eq!(body.processes[0].description, "Main register");
        assert_eq!(body.processes[1].name, "unnamed");
        assert_eq!(body.processes[1].sensitivity_list, "");

        let names: Vec<&str> = body.instantiations.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["l0", "l1"]);
        assert!(body.instantiations.iter().all(|i| i.instantiated_unit == "lane"));
        assert!(body.instantiations.iter().all(|i| i.description == "Lanes"));
    }

    #[test]
    fn test_missing_architecture() {
        let tree = parse(HdlLanguage::Vhdl, "entity e is end;");
        let result = extract_body(&tree, "e", &ExtractContext::new(HdlLanguage::Vhdl, "!"));
        assert!(matches!(result, Err(ExtractionError::MalformedRegion { .. })));
    }
}
