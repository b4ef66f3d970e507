//! Doxygen-style `@tag` lines inside documentation comments.
//!
//! Unit descriptions may carry informational tags (`@author`, `@version`, ...)
//! that are lifted into a map, and `@brief`/`@details` prefixes that are
//! dropped. Inside a port list, tag-only comments open port groups
//! (`@portgroup`) and virtual buses (`@virtualbus ... @end`).

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::constants::{DESCRIPTION_TAGS, INFO_TAGS};
use crate::parser::profile::LanguageProfile;
use crate::utils::normalize_description;

lazy_static! {
    static ref TAG_LINE: Regex = Regex::new(r"^@([A-Za-z_]+)\b\s*(.*)$").unwrap();
}

/// Split a unit description into plain text and informational tags.
/// Unknown tags stay in the text untouched.
pub fn split_tags(description: &str) -> (String, IndexMap<String, String>) {
    let mut info = IndexMap::new();
    let mut kept: Vec<&str> = Vec::new();
    for line in description.lines() {
        let trimmed = line.trim();
        let Some(caps) = TAG_LINE.captures(trimmed) else {
            kept.push(line);
            continue;
        };
        let tag = caps[1].to_ascii_lowercase();
        let rest = caps.get(2).map_or("", |m| m.as_str()).trim();
        if INFO_TAGS.contains(&tag.as_str()) {
            info.insert(tag, rest.to_string());
        } else if DESCRIPTION_TAGS.contains(&tag.as_str()) {
            kept.push(rest);
        } else {
            kept.push(line);
        }
    }
    (normalize_description(&kept.join("\n")), info)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortTag {
    /// Following ports belong to this group.
    Group(String),
    /// Following ports are members of a virtual bus until [`PortTag::BusEnd`].
    BusStart {
        name: String,
        direction: String,
        description: String,
    },
    BusEnd,
}

/// Port-list tag held by a documentation comment body, if any.
pub fn port_tag(body: &str, profile: &LanguageProfile) -> Option<PortTag> {
    let caps = TAG_LINE.captures(body.trim())?;
    let rest = caps.get(2).map_or("", |m| m.as_str()).trim();
    match caps[1].to_ascii_lowercase().as_str() {
        "portgroup" => Some(PortTag::Group(rest.to_string())),
        "virtualbus" => {
            let mut words = rest.split_whitespace();
            let name = words.next()?.to_string();
            let mut direction = String::new();
            let mut description: Vec<&str> = Vec::new();
            while let Some(word) = words.next() {
                if word.eq_ignore_ascii_case("@dir") {
                    direction = words.next().map(|d| profile.direction(d)).unwrap_or_default();
                } else {
                    description.push(word);
                }
            }
            Some(PortTag::BusStart {
                name,
                direction,
                description: description.join(" "),
            })
        }
        "end" => Some(PortTag::BusEnd),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::profile::{VERILOG, VHDL};

    #[test]
    fn test_split_tags() {
        let (text, info) = split_tags(
            "@brief Round robin arbiter\n@author Jane Doe\nGrants one request per cycle\n@version 1.2\n@note keep",
        );
        assert_eq!(text, "Round robin arbiter\nGrants one request per cycle\n@note keep");
        assert_eq!(info.get("author").map(String::as_str), Some("Jane Doe"));
        assert_eq!(info.get("version").map(String::as_str), Some("1.2"));
        let keys: Vec<&str> = info.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["author", "version"]);
    }

    #[test]
    fn test_plain_description_untouched() {
        let (text, info) = split_tags("Eight bit counter\nwith reset");
        assert_eq!(text, "Eight bit counter\nwith reset");
        assert!(info.is_empty());
    }

    #[test]
    fn test_port_tags() {
        assert_eq!(
            port_tag("@portgroup Clocks and resets", &VHDL),
            Some(PortTag::Group("Clocks and resets".to_string()))
        );
        assert_eq!(
            port_tag("@virtualbus axi_w @dir output Write channel", &VERILOG),
            Some(PortTag::BusStart {
                name: "axi_w".to_string(),
                direction: "out".to_string(),
                description: "Write channel".to_string(),
            })
        );
        assert_eq!(port_tag(" @end ", &VHDL), Some(PortTag::BusEnd));
        assert_eq!(port_tag("@virtualbus", &VHDL), None);
        assert_eq!(port_tag("Clock input", &VHDL), None);
        assert_eq!(port_tag("@endpoint", &VHDL), None);
    }
}
