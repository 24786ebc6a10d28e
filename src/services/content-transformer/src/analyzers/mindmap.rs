use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::ellipsize;

pub const CENTER_X: f64 = 400.0;
pub const CENTER_Y: f64 = 300.0;
pub const BRANCH_RADIUS: f64 = 200.0;
const BRANCH_LABEL_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub level: u8,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMap {
    pub title: String,
    pub nodes: Vec<MindMapNode>,
}

impl MindMap {
    pub fn central(&self) -> Option<&MindMapNode> {
        self.nodes.first()
    }

    pub fn branches(&self) -> &[MindMapNode] {
        self.nodes.get(1..).unwrap_or(&[])
    }
}

fn opens_branch(line: &str) -> bool {
    line.starts_with("##") || line.starts_with("**") || line.contains(':')
}

/// Groups lines under headings; text before the first heading is dropped
pub fn extract_branches(text: &str) -> Vec<String> {
    let mut branches = Vec::new();
    let mut current = String::new();

    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        if opens_branch(line) {
            if !current.is_empty() {
                branches.push(std::mem::take(&mut current));
            }
            current = line
                .chars()
                .filter(|c| !matches!(c, '#' | '*' | ':'))
                .collect::<String>()
                .trim()
                .to_string();
        } else if !current.is_empty() {
            current.push(' ');
            current.push_str(line.trim());
        }
    }

    if !current.is_empty() {
        branches.push(current);
    }
    branches
}

/// Central node plus one node per branch on a circle around it
pub fn build(text: &str, title: &str) -> MindMap {
    let branches = extract_branches(text);
    let angle_step = 2.0 * PI / branches.len().max(1) as f64;

    let mut central = MindMapNode {
        id: "node-0".to_string(),
        text: title.to_string(),
        x: CENTER_X,
        y: CENTER_Y,
        level: 0,
        children: Vec::with_capacity(branches.len()),
    };

    let branch_nodes: Vec<MindMapNode> = branches
        .iter()
        .enumerate()
        .map(|(index, branch)| {
            let angle = index as f64 * angle_step;
            MindMapNode {
                id: format!("node-{}", index + 1),
                text: ellipsize(branch, BRANCH_LABEL_CHARS),
                x: CENTER_X + angle.cos() * BRANCH_RADIUS,
                y: CENTER_Y + angle.sin() * BRANCH_RADIUS,
                level: 1,
                children: Vec::new(),
            }
        })
        .collect();

    central.children = branch_nodes.iter().map(|node| node.id.clone()).collect();

    let mut nodes = Vec::with_capacity(branch_nodes.len() + 1);
    nodes.push(central);
    nodes.extend(branch_nodes);

    MindMap {
        title: title.to_string(),
        nodes,
    }
}
