//! Graphviz DOT renderer.
//!
//! Produces a digraph that can be piped straight into Graphviz:
//!   curl 'localhost:8080/data?r=dot' | dot -Tpng -o replication.png

use pgtopo::{Role, Snapshot};

/// Render a snapshot as a DOT digraph with an edge from each standby to
/// its upstream.
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::with_capacity(64 + snapshot.len() * 64);
    out.push_str("digraph replication {\n");

    for (address, server) in snapshot {
        out.push_str(&format!(
            "\"{}\" [color={}];\n",
            escape(address),
            color(server.role)
        ));
        if let Some(upstream) = &server.upstream {
            out.push_str(&format!(
                "\"{}\" -> \"{}\";\n",
                escape(address),
                escape(upstream)
            ));
        }
    }

    out.push_str("}\n");
    out
}

fn color(role: Role) -> &'static str {
    match role {
        Role::Master => "green",
        Role::Relay => "blue",
        Role::Replica => "red",
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pgtopo::ServerRecord;

    #[test]
    fn test_render_chain() {
        let now = Utc::now();
        let mut snapshot = Snapshot::new();
        for record in [
            ServerRecord::from_probe("a", None, false, &["b".to_string()], now),
            ServerRecord::from_probe("b", Some("a"), true, &["c".to_string()], now),
            ServerRecord::from_probe("c", Some("b"), true, &[], now),
        ] {
            snapshot.insert(record.address.clone(), record);
        }

        assert_eq!(
            render(&snapshot),
            "digraph replication {\n\
             \"a\" [color=green];\n\
             \"b\" [color=blue];\n\
             \"b\" -> \"a\";\n\
             \"c\" [color=red];\n\
             \"c\" -> \"b\";\n\
             }\n"
        );
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape(r#"a"b"#), r#"a\"b"#);
    }
}
