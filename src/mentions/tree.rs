use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::types::{DistilledMention, Mention, MentionNode, ROOT_PARENT};

/// Counters describing what happened to the parent edges during assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    /// Edges that attached a mention under another mention.
    pub attached: usize,
    /// Edges dropped because they would have closed a cycle.
    pub rejected_cycles: usize,
    /// Edges naming a parent id absent from the input.
    pub unknown_parents: usize,
    /// Mentions that ended up neither a root nor anyone's child.
    pub orphans: usize,
}

/// Flat mentions linked by parent id, with cyclic edges already pruned.
///
/// Edges are considered in input order, mention by mention and then parent
/// by parent. An edge is dropped when the parent is the mention itself or
/// one of its descendants at that moment, so the first edge that would close
/// a cycle loses and every edge accepted before it stays. A mention may hang
/// under several parents; it is then repeated under each of them in the
/// output.
pub struct MentionTree<'a> {
    /// Mentions in input order, first occurrence of each id only.
    mentions: Vec<&'a DistilledMention>,
    index: HashMap<i64, usize>,
    /// Parent id to child ids, in attachment order.
    children: HashMap<i64, Vec<i64>>,
    stats: AssemblyStats,
}

impl<'a> MentionTree<'a> {
    pub fn build(input: &'a [DistilledMention]) -> Self {
        let mut mentions: Vec<&'a DistilledMention> = Vec::with_capacity(input.len());
        let mut index: HashMap<i64, usize> = HashMap::with_capacity(input.len());

        for mention in input {
            if index.contains_key(&mention.id) {
                debug!(id = mention.id, "ignoring repeated mention id");
                continue;
            }
            index.insert(mention.id, mentions.len());
            mentions.push(mention);
        }

        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut stats = AssemblyStats::default();

        for mention in &mentions {
            for &parent in &mention.parents {
                if parent == ROOT_PARENT {
                    continue;
                }
                if !index.contains_key(&parent) {
                    stats.unknown_parents += 1;
                    continue;
                }
                if reaches(&children, mention.id, parent) {
                    debug!(id = mention.id, parent, "dropping parent edge that would form a cycle");
                    stats.rejected_cycles += 1;
                    continue;
                }
                let siblings = children.entry(parent).or_default();
                if !siblings.contains(&mention.id) {
                    siblings.push(mention.id);
                    stats.attached += 1;
                }
            }
        }

        let attached: HashSet<i64> = children.values().flatten().copied().collect();
        stats.orphans = mentions
            .iter()
            .filter(|m| !is_root(m) && !attached.contains(&m.id))
            .count();

        debug!(
            mentions = mentions.len(),
            attached = stats.attached,
            rejected_cycles = stats.rejected_cycles,
            unknown_parents = stats.unknown_parents,
            orphans = stats.orphans,
            "assembled mention tree"
        );

        Self {
            mentions,
            index,
            children,
            stats,
        }
    }

    pub fn stats(&self) -> &AssemblyStats {
        &self.stats
    }

    /// Child ids attached under `id`, in attachment order.
    pub fn children_of(&self, id: i64) -> &[i64] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Builds fresh output trees for every root, in input order.
    ///
    /// Roots are the mentions listing `ROOT_PARENT` among their parents. The
    /// output carries no ids or parent lists.
    pub fn roots(&self) -> Vec<MentionNode> {
        let mut built: HashMap<i64, MentionNode> = HashMap::new();
        self.mentions
            .iter()
            .filter(|m| is_root(m))
            .map(|m| self.node(m.id, &mut built))
            .collect()
    }

    fn node(&self, id: i64, built: &mut HashMap<i64, MentionNode>) -> MentionNode {
        if let Some(node) = built.get(&id) {
            return node.clone();
        }

        let mention = self.mentions[self.index[&id]];
        let children: Vec<MentionNode> = self
            .children_of(id)
            .iter()
            .map(|&child| self.node(child, built))
            .collect();

        let node = MentionNode {
            mention: Mention::from(mention),
            mentions: if children.is_empty() {
                None
            } else {
                Some(children)
            },
        };
        built.insert(id, node.clone());
        node
    }
}

/// Links flat mentions into entry-rooted trees, dropping cyclic edges.
pub fn assemble(mentions: &[DistilledMention]) -> Vec<MentionNode> {
    MentionTree::build(mentions).roots()
}

fn is_root(mention: &DistilledMention) -> bool {
    mention.parents.contains(&ROOT_PARENT)
}

/// Returns `true` if `target` is `from` or currently one of its descendants.
fn reaches(children: &HashMap<i64, Vec<i64>>, from: i64, target: i64) -> bool {
    if from == target {
        return true;
    }

    let mut visited: HashSet<i64> = HashSet::new();
    let mut queue: VecDeque<i64> = VecDeque::new();
    visited.insert(from);
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        let Some(kids) = children.get(&current) else {
            continue;
        };
        for &kid in kids {
            if kid == target {
                return true;
            }
            if visited.insert(kid) {
                queue.push_back(kid);
            }
        }
    }

    false
}
