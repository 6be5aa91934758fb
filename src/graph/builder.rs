use crate::format::{escape_html, format_template};
use crate::model::{Job, Snapshot};

use super::types::{Edge, Graph, GraphOptions, Node};

const STOPPED_CLASS: &str = "stopped";
const RUNNING_STATUS: &str = "running";
const EMPHASIS_CLASS: &str = "warn";
const CORNER_RADIUS: f64 = 5.0;
const EDGE_WIDTH: f64 = 40.0;

/// Builds the layout graph for a snapshot with the default options.
///
/// One node per job, and one edge per upstream id in `previous`. Edges of a job are
/// registered last-listed predecessor first, which the layout engine uses for
/// tie-breaking.
pub fn build_graph(snapshot: &Snapshot) -> Graph {
    build_graph_with(snapshot, GraphOptions::default())
}

pub fn build_graph_with(snapshot: &Snapshot, options: GraphOptions) -> Graph {
    let label_type = options.labels;
    let mut graph = Graph::new(options);

    for (id, job) in snapshot.iter() {
        graph.set_node(Node {
            id: id.to_string(),
            label: render_label(job),
            text: render_text(job),
            label_type,
            rx: CORNER_RADIUS,
            ry: CORNER_RADIUS,
            padding: 0.0,
            class: status_class(job),
        });

        for upstream in job.previous.iter().rev() {
            graph.set_edge(Edge {
                from: upstream.clone(),
                to: id.to_string(),
                width: EDGE_WIDTH,
            });
        }
    }

    graph
}

/// Node classifiers for a job. Running jobs also carry the emphasis class.
pub fn status_class(job: &Job) -> String {
    match job.status() {
        None => STOPPED_CLASS.to_string(),
        Some(RUNNING_STATUS) => format!("{RUNNING_STATUS} {EMPHASIS_CLASS}"),
        Some(status) => status.to_string(),
    }
}

/// HTML label: status dot, name, then build link and duration when a build exists.
pub fn render_label(job: &Job) -> String {
    let mut html = String::from("<div>");
    html.push_str(r#"<span class="status"></span>"#);
    html.push_str(&format_template(
        r#"<span class="name">{0}</span>"#,
        &[&escape_html(&job.name)],
    ));

    if let Some(build) = &job.build {
        html.push_str(&format_template(
            r#"<span class="buildurl"><a href="{0}">#{1}</a></span>"#,
            &[&escape_html(&build.full_url), &escape_html(&build.number.to_string())],
        ));

        if let Some(duration) = job.duration() {
            html.push_str(&format_template(
                r#"<span class="buildurl">{0}sec</span>"#,
                &[&duration],
            ));
        }
    }

    html.push_str("</div>");
    html
}

/// Plain-text counterpart of [`render_label`].
pub fn render_text(job: &Job) -> String {
    let mut text = job.name.clone();
    if let Some(build) = &job.build {
        text.push_str(&format!(" #{}", build.number));
        if let Some(duration) = job.duration() {
            text.push_str(&format!(" {duration}sec"));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LabelType, RankDir};
    use crate::model::fixtures::{build, job};

    fn with_status(status: Option<&str>) -> Job {
        Job {
            status: status.map(str::to_string),
            ..job("a")
        }
    }

    mod status_class_tests {
        use super::*;

        #[test]
        fn test_running_gets_emphasis() {
            assert_eq!(status_class(&with_status(Some("running"))), "running warn");
        }

        #[test]
        fn test_absent_or_empty_is_stopped() {
            assert_eq!(status_class(&with_status(None)), "stopped");
            assert_eq!(status_class(&with_status(Some(""))), "stopped");
        }

        #[test]
        fn test_terminal_status_passes_through() {
            assert_eq!(status_class(&with_status(Some("success"))), "success");
            assert_eq!(status_class(&with_status(Some("failure"))), "failure");
        }
    }

    mod label_tests {
        use super::*;

        #[test]
        fn test_no_build_hides_link_and_duration() {
            let j = Job {
                duration: Some(42.0),
                ..job("compile")
            };
            let label = render_label(&j);
            assert_eq!(
                label,
                r#"<div><span class="status"></span><span class="name">compile</span></div>"#
            );
            assert!(!label.contains("sec"));
        }

        #[test]
        fn test_build_without_duration() {
            let j = Job {
                build: Some(build("http://x", 7)),
                ..job("compile")
            };
            let label = render_label(&j);
            assert!(label.contains(r#"<a href="http://x">#7</a>"#));
            assert!(!label.contains("sec</span>"));
        }

        #[test]
        fn test_duration_follows_build_link() {
            let j = Job {
                build: Some(build("http://x", 7)),
                duration: Some(42.0),
                ..job("compile")
            };
            assert_eq!(
                render_label(&j),
                concat!(
                    r#"<div><span class="status"></span><span class="name">compile</span>"#,
                    r#"<span class="buildurl"><a href="http://x">#7</a></span>"#,
                    r#"<span class="buildurl">42sec</span></div>"#
                )
            );
        }

        #[test]
        fn test_fractional_duration() {
            let j = Job {
                build: Some(build("http://x", 1)),
                duration: Some(3.25),
                ..job("compile")
            };
            assert!(render_label(&j).contains(">3.25sec<"));
        }

        #[test]
        fn test_name_is_escaped() {
            let j = job("<b>&co</b>");
            assert!(render_label(&j).contains("&lt;b&gt;&amp;co&lt;/b&gt;"));
        }

        #[test]
        fn test_plain_text() {
            let j = Job {
                build: Some(build("http://x", 7)),
                duration: Some(42.0),
                ..job("compile")
            };
            assert_eq!(render_text(&j), "compile #7 42sec");
            assert_eq!(render_text(&job("lint")), "lint");
        }
    }

    mod build_graph_tests {
        use super::*;

        #[test]
        fn test_edges_registered_in_reverse_predecessor_order() {
            let c = Job {
                previous: vec!["a".to_string(), "b".to_string()],
                ..job("c")
            };
            let snapshot: Snapshot = [job("a"), job("b"), c].into_iter().collect();

            let graph = build_graph(&snapshot);
            let edges: Vec<_> = graph
                .edges()
                .map(|e| (e.from.as_str(), e.to.as_str()))
                .collect();

            assert_eq!(edges, vec![("b", "c"), ("a", "c")]);
            assert!(graph.edges().all(|e| e.width == 40.0));
        }

        #[test]
        fn test_one_node_per_job_with_shape_hints() {
            let snapshot: Snapshot = [
                with_status(Some("running")),
                Job {
                    status: Some("success".to_string()),
                    ..job("b")
                },
            ]
            .into_iter()
            .collect();

            let graph = build_graph(&snapshot);
            assert_eq!(graph.node_count(), 2);

            let a = graph.node("a").unwrap();
            assert_eq!(a.class, "running warn");
            assert_eq!(a.label_type, LabelType::Html);
            assert_eq!((a.rx, a.ry, a.padding), (5.0, 5.0, 0.0));
            assert_eq!(graph.node("b").unwrap().class, "success");
        }

        #[test]
        fn test_duplicate_predecessor_registers_one_edge() {
            let b = Job {
                previous: vec!["a".to_string(), "a".to_string()],
                ..job("b")
            };
            let snapshot: Snapshot = [job("a"), b].into_iter().collect();
            assert_eq!(build_graph(&snapshot).edge_count(), 1);
        }

        #[test]
        fn test_missing_predecessor_is_not_validated() {
            let b = Job {
                previous: vec!["ghost".to_string()],
                ..job("b")
            };
            let snapshot: Snapshot = [b].into_iter().collect();
            let graph = build_graph(&snapshot);
            assert_eq!(graph.edge_count(), 1);
            assert!(graph.node("ghost").is_none());
        }

        #[test]
        fn test_empty_snapshot() {
            let graph = build_graph(&Snapshot::default());
            assert_eq!(graph.node_count(), 0);
            assert_eq!(graph.edge_count(), 0);
            assert_eq!(graph.options, GraphOptions::default());
        }

        #[test]
        fn test_options_are_carried_to_nodes() {
            let options = GraphOptions {
                rankdir: RankDir::LeftRight,
                labels: LabelType::Text,
                ..GraphOptions::default()
            };
            let snapshot: Snapshot = [job("a")].into_iter().collect();

            let graph = build_graph_with(&snapshot, options);

            assert_eq!(graph.options.rankdir, RankDir::LeftRight);
            assert_eq!(graph.node("a").unwrap().label_type, LabelType::Text);
        }

        #[test]
        fn test_graph_serializes_as_lists() {
            let b = Job {
                previous: vec!["a".to_string()],
                ..job("b")
            };
            let snapshot: Snapshot = [job("a"), b].into_iter().collect();
            let value = serde_json::to_value(build_graph(&snapshot)).unwrap();

            assert_eq!(value["nodes"][0]["id"], "a");
            assert_eq!(value["nodes"][0]["labelType"], "html");
            assert_eq!(value["edges"][0]["from"], "a");
            assert_eq!(value["options"]["rankdir"], "TB");
        }
    }
}
