//! Generic (parameter) and port lists of an entity or module.
//!
//! Besides plain documentation comments, the port list understands
//! `@portgroup <name>` (every following port joins the group) and
//! `@virtualbus <name> [@dir <direction>] <description>` ... `@end`, which
//! gathers the ports in between into a [`VirtualBus`].

use super::comments::{annotate_row, CommentAssociator};
use super::doxygen::{port_tag, PortTag};
use super::{flat_text, initial_value, listed_names, region_items, ExtractContext};
use crate::ir::{Generic, HdlLanguage, Port, VirtualBus};
use crate::parser::cst::Node;

/// Everything the header of an entity or module declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interface {
    pub generics: Vec<Generic>,
    pub ports: Vec<Port>,
    pub virtual_buses: Vec<VirtualBus>,
}

/// Extract generics and ports from an entity (VHDL) or module (Verilog) node.
pub fn extract_interface(unit: Node<'_>, ctx: &ExtractContext<'_>) -> Interface {
    let mut walk = InterfaceWalk {
        ctx,
        assoc: ctx.associator(),
        out: Interface::default(),
        group: String::new(),
        open_bus: None,
        inherited: None,
    };
    match ctx.language() {
        HdlLanguage::Vhdl => {
            if let Some(head) = unit.child_by_kind("entity_head") {
                walk.vhdl_head(head);
            }
        }
        HdlLanguage::Verilog => walk.verilog_module(unit),
    }
    walk.close_bus();
    walk.out
}

struct InterfaceWalk<'c, 'a> {
    ctx: &'c ExtractContext<'a>,
    assoc: CommentAssociator<'a>,
    out: Interface,
    group: String,
    open_bus: Option<VirtualBus>,
    /// Direction and type of the previous ANSI port, for headerless entries.
    inherited: Option<(String, String)>,
}

impl InterfaceWalk<'_, '_> {
    fn comment(&mut self, node: Node<'_>) {
        let tag = self
            .assoc
            .doc_body(node.text())
            .and_then(|body| port_tag(&body, self.ctx.profile));
        if let Some(tag) = tag {
            self.assoc.interrupt(node);
            self.port_tag(tag);
            return;
        }
        let generics = &mut self.out.generics;
        let ports = &mut self.out.ports;
        self.assoc.comment(node, |row, text| {
            let generic_hit = annotate_row(generics, row, text);
            let port_hit = annotate_row(ports, row, text);
            generic_hit || port_hit
        });
    }

    fn port_tag(&mut self, tag: PortTag) {
        match tag {
            PortTag::Group(name) => self.group = name,
            PortTag::BusStart {
                name,
                direction,
                description,
            } => {
                self.close_bus();
                self.open_bus = Some(VirtualBus {
                    name,
                    direction,
                    description,
                    ports: Vec::new(),
                });
            }
            PortTag::BusEnd => self.close_bus(),
        }
    }

    fn close_bus(&mut self) {
        if let Some(bus) = self.open_bus.take() {
            self.out.virtual_buses.push(bus);
        }
    }

    fn other(&mut self, node: Node<'_>) {
        if node.is_named() {
            self.assoc.interrupt(node);
        }
    }

    fn push_generic(&mut self, name: &str, type_name: &str, default_value: &str, row: usize, description: &str) {
        self.out.generics.push(Generic {
            name: name.to_string(),
            type_name: type_name.to_string(),
            description: description.to_string(),
            default_value: default_value.to_string(),
            source_line: row,
        });
    }

    fn push_port(
        &mut self,
        name: &str,
        direction: &str,
        type_name: &str,
        default_value: &str,
        row: usize,
        description: &str,
    ) {
        if let Some(bus) = self.open_bus.as_mut() {
            bus.ports.push(name.to_string());
        }
        self.out.ports.push(Port {
            name: name.to_string(),
            direction: direction.to_string(),
            type_name: type_name.to_string(),
            description: description.to_string(),
            default_value: default_value.to_string(),
            group: self.group.clone(),
            source_line: row,
        });
    }

    // =========================================================================
    // VHDL
    // =========================================================================

    fn vhdl_head(&mut self, head: Node<'_>) {
        for clause in head.children() {
            let is_port = match clause.kind() {
                "generic_clause" => false,
                "port_clause" => true,
                _ => {
                    self.vhdl_item(clause, false);
                    continue;
                }
            };
            for child in clause.children() {
                if child.kind() == "interface_list" {
                    for item in child.children() {
                        self.vhdl_item(item, is_port);
                    }
                } else {
                    self.vhdl_item(child, is_port);
                }
            }
        }
    }

    fn vhdl_item(&mut self, node: Node<'_>, is_port: bool) {
        match node.kind() {
            kind if self.ctx.profile.is_comment(kind) => self.comment(node),
            "interface_declaration" | "interface_constant_declaration" | "interface_signal_declaration"
            | "interface_variable_declaration" => self.vhdl_declaration(node, is_port),
            _ => self.other(node),
        }
    }

    fn vhdl_declaration(&mut self, decl: Node<'_>, is_port: bool) {
        let names = decl
            .child_by_kind("identifier_list")
            .map(listed_names)
            .unwrap_or_default();
        if names.is_empty() {
            self.assoc.interrupt(decl);
            return;
        }
        let indication = decl.child_by_kind("simple_mode_indication").unwrap_or(decl);
        let type_name = indication
            .child_by_kind("subtype_indication")
            .map(flat_text)
            .unwrap_or_default();
        let default_value = initial_value(indication);
        let direction = indication
            .child_by_kind("mode")
            .map(|m| self.ctx.profile.direction(m.text()))
            .unwrap_or_default();
        let description = self.assoc.take();
        let row = decl.start_row();
        for name in names {
            if is_port {
                self.push_port(name, &direction, &type_name, &default_value, row, &description);
            } else {
                self.push_generic(name, &type_name, &default_value, row, &description);
            }
        }
    }

    // =========================================================================
    // Verilog
    // =========================================================================

    fn verilog_module(&mut self, module: Node<'_>) {
        for child in region_items(module, self.ctx.profile) {
            match child.kind() {
                "module_ansi_header" => {
                    for part in child.children() {
                        match part.kind() {
                            "parameter_port_list" => self.parameter_port_list(part),
                            "list_of_port_declarations" => self.ansi_ports(part),
                            _ => self.other(part),
                        }
                    }
                }
                "port_declaration" => self.body_port(child),
                "parameter_declaration" => self.parameters(child),
                kind if self.ctx.profile.is_comment(kind) => self.comment(child),
                _ => self.other(child),
            }
        }
    }

    fn parameter_port_list(&mut self, list: Node<'_>) {
        for item in list.children() {
            let decl = match item.kind() {
                "parameter_port_declaration" => item.named_children().next().unwrap_or(item),
                kind if self.ctx.profile.is_comment(kind) => {
                    self.comment(item);
                    continue;
                }
                _ => {
                    self.other(item);
                    continue;
                }
            };
            // Header localparams are not overridable, so they are not generics
            match decl.kind() {
                "parameter_declaration" => self.parameters(decl),
                _ => self.assoc.interrupt(decl),
            }
        }
    }

    /// `parameter [type] A = 1, B = 2`, in the header or the body.
    fn parameters(&mut self, decl: Node<'_>) {
        let assignments: Vec<Node<'_>> = decl
            .child_by_kind("list_of_param_assignments")
            .map(|list| list.children_by_kind("param_assignment").collect())
            .unwrap_or_default();
        if assignments.is_empty() {
            self.assoc.interrupt(decl);
            return;
        }
        let type_name = decl
            .child_by_kind("data_type_or_implicit1")
            .map(flat_text)
            .unwrap_or_default();
        let description = self.assoc.take();
        for assignment in assignments {
            let Some(name) = assignment.child_by_kind("parameter_identifier") else {
                continue;
            };
            let default_value = assignment
                .child_by_kind("constant_param_expression")
                .map(flat_text)
                .unwrap_or_default();
            self.push_generic(name.text(), &type_name, &default_value, assignment.start_row(), &description);
        }
    }

    fn ansi_ports(&mut self, list: Node<'_>) {
        for item in list.children() {
            match item.kind() {
                "ansi_port_declaration" => self.ansi_port(item),
                kind if self.ctx.profile.is_comment(kind) => self.comment(item),
                _ => self.other(item),
            }
        }
    }

    /// One entry of an ANSI port list. An entry without a header repeats the
    /// direction and type of the entry before it.
    fn ansi_port(&mut self, decl: Node<'_>) {
        let Some(name) = decl.child_by_kind("port_identifier") else {
            self.assoc.interrupt(decl);
            return;
        };
        let header = decl.child_by_kinds(&["net_port_header1", "variable_port_header", "interface_port_header"]);
        let (direction, type_name) = match (header, self.inherited.clone()) {
            (Some(header), previous) => {
                let direction = header
                    .child_by_kind("port_direction")
                    .map(|d| self.ctx.profile.direction(d.text()))
                    .or_else(|| previous.map(|(direction, _)| direction))
                    .unwrap_or_default();
                let type_name = header
                    .named_children()
                    .filter(|n| n.kind() != "port_direction" && !self.ctx.profile.is_comment(n.kind()))
                    .map(flat_text)
                    .collect::<Vec<_>>()
                    .join(" ");
                (direction, type_name)
            }
            (None, Some(previous)) => previous,
            (None, None) => (String::new(), String::new()),
        };
        self.inherited = Some((direction.clone(), type_name.clone()));
        let description = self.assoc.take();
        self.push_port(name.text(), &direction, &type_name, "", decl.start_row(), &description);
    }

    /// Non-ANSI `input [3:0] a, b;` in the module body.
    fn body_port(&mut self, port: Node<'_>) {
        let Some(decl) = port.named_children().next() else {
            self.assoc.interrupt(port);
            return;
        };
        let keyword = decl.kind().strip_suffix("_declaration").unwrap_or_default();
        let direction = self.ctx.profile.direction(keyword);
        let type_name = decl
            .child_by_kinds(&["net_port_type1", "data_type", "var_data_type"])
            .map(flat_text)
            .unwrap_or_default();
        let names: Vec<&str> = decl
            .child_by_kinds(&["list_of_port_identifiers", "list_of_variable_port_identifiers"])
            .map(|list| list.children_by_kind("port_identifier").map(|n| n.text()).collect())
            .unwrap_or_default();
        if names.is_empty() {
            self.assoc.interrupt(port);
            return;
        }
        let description = self.assoc.take();
        let row = port.start_row();
        for name in names {
            self.push_port(name, &direction, &type_name, "", row, &description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::grammar;

    fn extract(language: HdlLanguage, kind: &str, source: &str) -> Interface {
        let tree = grammar::load(language).unwrap().parse(source).unwrap();
        let unit = tree.root().find_first(&[kind]).unwrap();
        extract_interface(unit, &ExtractContext::new(language, "!"))
    }

    fn vhdl(source: &str) -> Interface {
        extract(HdlLanguage::Vhdl, "entity_declaration", source)
    }

    fn verilog(source: &str) -> Interface {
        extract(HdlLanguage::Verilog, "module_declaration", source)
    }

    #[test]
    fn test_vhdl_generics_and_ports() {
        let Interface { generics, ports, .. } = vhdl(
            "\
entity counter is
  generic (
    --! Counter width
    WIDTH : integer := 8;
    DEPTH : natural := 4 --! Fifo depth
  );
  port (
    clk, rst : in std_logic; --! Clock and reset
    --! Count value
    q : out std_logic_vector(WIDTH - 1 downto 0);
    en : std_logic
  );
end entity;
",
        );
        assert_eq!(generics.len(), 2);
        assert_eq!(generics[0].name, "WIDTH");
        assert_eq!(generics[0].type_name, "integer");
        assert_eq!(generics[0].default_value, "8");
        assert_eq!(generics[0].description, "Counter width");
        assert_eq!(generics[0].source_line, 3);
        assert_eq!(generics[1].default_value, "4");
        assert_eq!(generics[1].description, "Fifo depth");

        let names: Vec<&str> = ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["clk", "rst", "q", "en"]);
        assert_eq!(ports[0].direction, "in");
        assert_eq!(ports[1].source_line, ports[0].source_line);
        assert_eq!(ports[1].description, "Clock and reset");
        assert_eq!(ports[2].direction, "out");
        assert_eq!(ports[2].type_name, "std_logic_vector(WIDTH - 1 downto 0)");
        assert_eq!(ports[2].description, "Count value");
        assert_eq!(ports[3].direction, "");
        assert_eq!(ports[3].description, "");
    }

    #[test]
    fn test_vhdl_plain_comment_resets_pending() {
        let Interface { ports, .. } = vhdl(
            "\
entity e is
  port (
    --! dropped
    -- plain comment
    a : in bit
  );
end;
",
        );
        assert_eq!(ports[0].description, "");
    }

    #[test]
    fn test_vhdl_port_groups_and_virtual_bus() {
        let interface = vhdl(
            "\
entity bus_if is
  port (
    --! @portgroup Clocking
    clk : in std_logic; --! Clock
    --! @virtualbus wr @dir in Write channel
    --! Write address
    wr_addr : in std_logic_vector(7 downto 0);
    wr_data : in std_logic_vector(31 downto 0);
    --! @end
    --! @portgroup Status
    busy : out std_logic
  );
end entity;
",
        );
        let groups: Vec<&str> = interface.ports.iter().map(|p| p.group.as_str()).collect();
        assert_eq!(groups, vec!["Clocking", "Clocking", "Clocking", "Status"]);
        assert_eq!(interface.ports[0].description, "Clock");
        assert_eq!(interface.ports[1].description, "Write address");
        assert_eq!(interface.ports[2].description, "");
        assert_eq!(
            interface.virtual_buses,
            vec![VirtualBus {
                name: "wr".to_string(),
                direction: "in".to_string(),
                description: "Write channel".to_string(),
                ports: vec!["wr_addr".to_string(), "wr_data".to_string()],
            }]
        );
    }

    #[test]
    fn test_verilog_ansi_header() {
        let interface = verilog(
            "\
module fifo #(
  //! Data width
  parameter int WIDTH = 8,
  parameter DEPTH = 16, //! Entries
  localparam int AW = 4
) (
  input  logic clk, rst, //! Clock and reset
  //! Write data
  input  logic [WIDTH-1:0] din,
  //! @portgroup Status
  output logic full
);
endmodule
",
        );
        let generics = &interface.generics;
        let names: Vec<&str> = generics.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["WIDTH", "DEPTH"]);
        assert_eq!(generics[0].type_name, "int");
        assert_eq!(generics[0].default_value, "8");
        assert_eq!(generics[0].description, "Data width");
        assert_eq!(generics[1].type_name, "");
        assert_eq!(generics[1].default_value, "16");
        assert_eq!(generics[1].description, "Entries");

        let ports = &interface.ports;
        let names: Vec<&str> = ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["clk", "rst", "din", "full"]);
        assert_eq!(ports[1].direction, "in");
        assert_eq!(ports[1].type_name, "logic");
        assert_eq!(ports[0].description, "Clock and reset");
        assert_eq!(ports[1].description, "Clock and reset");
        assert_eq!(ports[2].type_name, "logic [WIDTH-1:0]");
        assert_eq!(ports[2].description, "Write data");
        assert_eq!(ports[2].group, "");
        assert_eq!(ports[3].direction, "out");
        assert_eq!(ports[3].group, "Status");
        assert!(interface.virtual_buses.is_empty());
    }

    #[test]
    fn test_verilog_non_ansi_ports() {
        let Interface { generics, ports, .. } = verilog(
            "\
module top (a, b, c);
  parameter N = 2;
  //! Inputs
  input [N-1:0] a, b;
  output reg c; //! Result
endmodule
",
        );
        assert_eq!(generics.len(), 1);
        assert_eq!(generics[0].name, "N");
        assert_eq!(generics[0].default_value, "2");
        assert_eq!(ports.len(), 3);
        assert_eq!(ports[0].direction, "in");
        assert_eq!(ports[0].type_name, "[N-1:0]");
        assert_eq!(ports[1].name, "b");
        assert_eq!(ports[1].description, "Inputs");
        assert_eq!(ports[2].direction, "out");
        assert_eq!(ports[2].type_name, "reg");
        assert_eq!(ports[2].description, "Result");
    }

    #[test]
    fn test_unterminated_bus_is_closed() {
        let interface = verilog(
            "\
module m (
  //! @virtualbus cfg Configuration
  input wire a,
  input wire b
);
endmodule
",
        );
        assert_eq!(interface.virtual_buses.len(), 1);
        assert_eq!(interface.virtual_buses[0].direction, "");
        assert_eq!(interface.virtual_buses[0].ports, vec!["a", "b"]);
    }
}
