//! SVG renderer.
//!
//! Masters sit at the left of the top row with relays to their right;
//! replicas fill the bottom row. Relays link sideways to their upstream,
//! replicas link upwards.

use pgtopo::{Role, Snapshot};
use std::collections::BTreeMap;

const RADIUS: i32 = 50;
const SPACING: i32 = 150;
const LEFT: i32 = 100;
const TOP_ROW: i32 = 150;
const BOTTOM_ROW: i32 = 300;
const MIN_SIZE: i32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Point {
    x: i32,
    y: i32,
}

/// Render a snapshot as a standalone SVG document.
pub fn render(snapshot: &Snapshot) -> String {
    let nodes = layout(snapshot);
    let width = nodes
        .values()
        .map(|p| p.x + SPACING)
        .max()
        .unwrap_or(0)
        .max(MIN_SIZE);

    let mut out = String::with_capacity(512 + nodes.len() * 256);
    out.push_str("<?xml version=\"1.0\"?>\n");
    out.push_str(&format!(
        "<svg width=\"{}\" height=\"{}\"\n     xmlns=\"http://www.w3.org/2000/svg\"\n     xmlns:xlink=\"http://www.w3.org/1999/xlink\">\n",
        width, MIN_SIZE
    ));
    out.push_str("<title>Postgresql Replication</title>\n");

    for (address, server) in snapshot {
        let p = nodes[address.as_str()];
        out.push_str(&format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" style=\"fill:{};stroke:black\"/>\n",
            p.x,
            p.y,
            RADIUS,
            fill(server.role)
        ));
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" style=\"text-anchor:middle;font-size:15px;fill:white\">{}</text>\n",
            p.x,
            p.y,
            escape(address)
        ));
    }

    for (address, server) in snapshot {
        let Some(dest) = server.upstream.as_ref().and_then(|u| nodes.get(u.as_str())) else {
            continue;
        };
        let src = nodes[address.as_str()];
        let (from, to) = match server.role {
            Role::Master => continue,
            Role::Relay => (
                Point { x: src.x - RADIUS, y: src.y },
                Point { x: dest.x + RADIUS, y: dest.y },
            ),
            Role::Replica => (
                Point { x: src.x, y: src.y - RADIUS },
                Point { x: dest.x, y: dest.y + RADIUS },
            ),
        };
        out.push_str(&format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" style=\"stroke-width:1; stroke:black\"/>\n",
            from.x, from.y, to.x, to.y
        ));
    }

    out.push_str("</svg>\n");
    out
}

fn layout(snapshot: &Snapshot) -> BTreeMap<&str, Point> {
    let mut relays = 0;
    let mut replicas = 0;

    snapshot
        .iter()
        .map(|(address, server)| {
            let point = match server.role {
                Role::Master => Point { x: LEFT, y: TOP_ROW },
                Role::Relay => {
                    relays += 1;
                    Point { x: LEFT + SPACING * relays, y: TOP_ROW }
                }
                Role::Replica => {
                    let p = Point { x: LEFT + SPACING * replicas, y: BOTTOM_ROW };
                    replicas += 1;
                    p
                }
            };
            (address.as_str(), point)
        })
        .collect()
}

fn fill(role: Role) -> &'static str {
    match role {
        Role::Master => "green",
        Role::Relay => "blue",
        Role::Replica => "red",
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
