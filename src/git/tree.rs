use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Folder,
}

/// One entry of the nested file tree shown next to search results.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

/// Nest flat `a/b/c.py` paths into folders, keeping first-seen order.
pub fn build_file_tree(paths: &[String]) -> Vec<TreeNode> {
    let mut tree = Vec::new();
    for path in paths {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        insert(&mut tree, &parts);
    }
    tree
}

fn insert(level: &mut Vec<TreeNode>, parts: &[&str]) {
    let Some((first, rest)) = parts.split_first() else {
        return;
    };

    let index = match level.iter().position(|n| n.name == *first) {
        Some(i) => i,
        None => {
            level.push(TreeNode {
                name: first.to_string(),
                kind: if rest.is_empty() {
                    NodeKind::File
                } else {
                    NodeKind::Folder
                },
                children: Vec::new(),
            });
            level.len() - 1
        }
    };

    if !rest.is_empty() {
        let node = &mut level[index];
        node.kind = NodeKind::Folder;
        insert(&mut node.children, rest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nests_paths() {
        let paths = vec![
            "README.md".to_string(),
            "src/app/main.py".to_string(),
            "src/app/util.py".to_string(),
            "src/lib.py".to_string(),
        ];
        let tree = build_file_tree(&paths);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].kind, NodeKind::File);
        let src = &tree[1];
        assert_eq!(src.kind, NodeKind::Folder);
        assert_eq!(src.children.len(), 2);
        assert_eq!(src.children[0].name, "app");
        assert_eq!(src.children[0].children.len(), 2);
        assert_eq!(src.children[1].name, "lib.py");
    }

    #[test]
    fn test_serializes_type_field() {
        let tree = build_file_tree(&["a/b.rs".to_string()]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[0]["type"], "folder");
        assert_eq!(json[0]["children"][0]["type"], "file");
        assert!(json[0]["children"][0].get("children").is_none());
    }
}
