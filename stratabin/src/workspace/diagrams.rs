//! Diagram operations
//!
//! Diagrams are generated from text and snapshot the canvas name at
//! creation time; they do not follow later edits to the canvas.
//!
//! Source formats:
//! - branch: an indented outline, one label per line, optional `-`/`*`/`+` bullets
//! - flowchart: chains of steps such as `Idea -> Draft -> Review`

use chrono::Utc;

use super::models::{Branch, Diagram, DiagramKind, DiagramPayload, FlowLink};
use super::store::WorkspaceStore;
use crate::error::{AppError, Result};

const TAB_WIDTH: usize = 4;

/// Derive the structured payload for a diagram source
pub fn build_payload(kind: DiagramKind, source: &str) -> DiagramPayload {
    match kind {
        DiagramKind::Branch => DiagramPayload::Branch {
            roots: parse_outline(source),
        },
        DiagramKind::Flowchart => {
            let (steps, links) = parse_flow(source);
            DiagramPayload::Flowchart { steps, links }
        }
    }
}

fn indentation(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

fn strip_bullet(text: &str) -> &str {
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = text.strip_prefix(bullet) {
            return rest.trim();
        }
    }
    text
}

fn attach(stack: &mut [(usize, Branch)], roots: &mut Vec<Branch>, branch: Branch) {
    match stack.last_mut() {
        Some((_, parent)) => parent.children.push(branch),
        None => roots.push(branch),
    }
}

fn parse_outline(source: &str) -> Vec<Branch> {
    let mut roots = Vec::new();
    let mut stack: Vec<(usize, Branch)> = Vec::new();

    for line in source.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = indentation(line);
        let label = strip_bullet(line.trim()).to_string();

        while stack.last().is_some_and(|(top, _)| *top >= indent) {
            if let Some((_, done)) = stack.pop() {
                attach(&mut stack, &mut roots, done);
            }
        }
        stack.push((
            indent,
            Branch {
                label,
                children: Vec::new(),
            },
        ));
    }

    while let Some((_, done)) = stack.pop() {
        attach(&mut stack, &mut roots, done);
    }

    roots
}

fn parse_flow(source: &str) -> (Vec<String>, Vec<FlowLink>) {
    let mut steps: Vec<String> = Vec::new();
    let mut links: Vec<FlowLink> = Vec::new();

    for line in source.lines() {
        let mut previous: Option<usize> = None;

        for label in line.split("->").map(str::trim).filter(|label| !label.is_empty()) {
            let index = match steps.iter().position(|step| step == label) {
                Some(index) => index,
                None => {
                    steps.push(label.to_string());
                    steps.len() - 1
                }
            };

            if let Some(from) = previous {
                let link = FlowLink { from, to: index };
                if !links.contains(&link) {
                    links.push(link);
                }
            }
            previous = Some(index);
        }
    }

    (steps, links)
}

impl WorkspaceStore {
    /// Generate a diagram from text for a canvas
    pub fn create_diagram(
        &mut self,
        canvas_id: &str,
        kind: DiagramKind,
        source: &str,
    ) -> Result<String> {
        let name = self.canvas(canvas_id)?.display_name().to_string();

        let id = Self::new_id();
        let diagram = Diagram {
            id: id.clone(),
            canvas_id: canvas_id.to_string(),
            name,
            kind,
            source: source.to_string(),
            payload: build_payload(kind, source),
            created_at: Utc::now(),
        };
        self.diagrams.insert(id.clone(), diagram);
        self.mark_changed();

        tracing::info!("Created {:?} diagram {} for canvas {}", kind, id, canvas_id);
        Ok(id)
    }

    pub fn diagram(&self, id: &str) -> Result<&Diagram> {
        self.diagrams
            .get(id)
            .ok_or_else(|| AppError::DiagramNotFound(id.to_string()))
    }

    /// Replace a diagram's source and regenerate its payload
    pub fn update_diagram_source(&mut self, id: &str, source: &str) -> Result<()> {
        let diagram = self
            .diagrams
            .get_mut(id)
            .ok_or_else(|| AppError::DiagramNotFound(id.to_string()))?;
        diagram.source = source.to_string();
        diagram.payload = build_payload(diagram.kind, source);
        self.mark_changed();
        Ok(())
    }

    pub fn delete_diagram(&mut self, id: &str) -> Result<()> {
        if self.diagrams.remove(id).is_none() {
            return Err(AppError::DiagramNotFound(id.to_string()));
        }
        self.mark_changed();
        Ok(())
    }

    /// Diagrams generated from a canvas, oldest first
    pub fn diagrams_for_canvas(&self, canvas_id: &str) -> Vec<&Diagram> {
        let mut diagrams: Vec<&Diagram> = self
            .diagrams
            .values()
            .filter(|diagram| diagram.canvas_id == canvas_id)
            .collect();
        diagrams.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        diagrams
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(label: &str) -> Branch {
        Branch {
            label: label.to_string(),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_parse_outline_builds_tree() {
        let roots = parse_outline("Goal\n  - Research\n    - Interviews\n  - Build\nSide quest\n");

        assert_eq!(
            roots,
            vec![
                Branch {
                    label: "Goal".to_string(),
                    children: vec![
                        Branch {
                            label: "Research".to_string(),
                            children: vec![leaf("Interviews")],
                        },
                        leaf("Build"),
                    ],
                },
                leaf("Side quest"),
            ]
        );
    }

    #[test]
    fn test_parse_flow_dedupes_steps_and_links() {
        let (steps, links) = parse_flow("Idea -> Draft -> Review\nReview -> Draft\nIdea -> Draft");

        assert_eq!(steps, vec!["Idea", "Draft", "Review"]);
        assert_eq!(
            links,
            vec![
                FlowLink { from: 0, to: 1 },
                FlowLink { from: 1, to: 2 },
                FlowLink { from: 2, to: 1 },
            ]
        );
    }

    #[test]
    fn test_diagram_snapshots_canvas_name() {
        let mut store = WorkspaceStore::new();
        let canvas = store.create_canvas();
        store.rename_canvas(&canvas, "Plan").unwrap();

        let id = store
            .create_diagram(&canvas, DiagramKind::Flowchart, "A -> B")
            .unwrap();
        store.rename_canvas(&canvas, "Renamed").unwrap();

        let diagram = store.diagram(&id).unwrap();
        assert_eq!(diagram.name, "Plan");
        assert_eq!(store.diagrams_for_canvas(&canvas).len(), 1);
    }

    #[test]
    fn test_update_diagram_source_regenerates_payload() {
        let mut store = WorkspaceStore::new();
        let canvas = store.create_canvas();
        let id = store
            .create_diagram(&canvas, DiagramKind::Branch, "Root")
            .unwrap();

        store.update_diagram_source(&id, "Root\n  Child").unwrap();

        match &store.diagram(&id).unwrap().payload {
            DiagramPayload::Branch { roots } => assert_eq!(roots[0].children.len(), 1),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_diagram_for_unknown_canvas_fails() {
        let mut store = WorkspaceStore::new();
        assert!(matches!(
            store.create_diagram("ghost", DiagramKind::Branch, "Root"),
            Err(AppError::CanvasNotFound(_))
        ));
    }
}
