// evolution.rs
// Flattens the nested evolution tree delivered by `/evolution-chain/{id}`.

use serde::{Deserialize, Serialize};

use crate::pokemon::{Id, NamedResource};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EvolutionChain {
    #[serde(default)]
    pub chain: Option<ChainLink>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChainLink {
    #[serde(default)]
    pub species: Option<NamedResource>,
    /// Conditions of the edge leading into this node. Empty at the root.
    #[serde(default)]
    pub evolution_details: Vec<EvolutionDetail>,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EvolutionDetail {
    #[serde(default)]
    pub trigger: Option<NamedResource>,
    #[serde(default)]
    pub min_level: Option<u32>,
    #[serde(default)]
    pub item: Option<NamedResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvolutionEntry {
    pub species_id: Id,
    pub species_name: String,
    pub trigger: Option<String>,
    pub min_level: Option<u32>,
    pub item: Option<String>,
}

/// Produces one entry per node in depth-first pre-order.
///
/// Only the first evolution detail of each edge is kept, so branching
/// conditions (e.g. "level up at night OR with an item") collapse into one.
/// A node whose species reference is absent or does not end in a numeric
/// identifier is skipped together with its subtree.
pub fn flatten(chain: &EvolutionChain) -> Vec<EvolutionEntry> {
    let mut entries = Vec::new();

    if let Some(root) = &chain.chain {
        visit(root, &mut entries);
    }

    entries
}

fn visit(link: &ChainLink, entries: &mut Vec<EvolutionEntry>) {
    let Some(species) = &link.species else {
        tracing::warn!("Skipping evolution node without a species reference");
        return;
    };

    let Some(id) = species.id() else {
        tracing::warn!(
            "Skipping evolution node {}: malformed species url {:?}",
            species.name,
            species.url
        );
        return;
    };

    let detail = link.evolution_details.first();

    entries.push(EvolutionEntry {
        species_id: Id(id),
        species_name: species.name.clone(),
        trigger: detail
            .and_then(|detail| detail.trigger.as_ref())
            .map(|trigger| trigger.name.clone()),
        min_level: detail.and_then(|detail| detail.min_level),
        item: detail
            .and_then(|detail| detail.item.as_ref())
            .map(|item| item.name.clone()),
    });

    for next in &link.evolves_to {
        visit(next, entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn species(id: u32, name: &str) -> Option<NamedResource> {
        Some(NamedResource {
            name: name.to_string(),
            url: format!("https://pokeapi.co/api/v2/pokemon-species/{id}/"),
        })
    }

    fn level_up(level: u32) -> EvolutionDetail {
        EvolutionDetail {
            trigger: Some(NamedResource {
                name: "level-up".to_string(),
                url: String::new(),
            }),
            min_level: Some(level),
            item: None,
        }
    }

    fn use_item(item: &str) -> EvolutionDetail {
        EvolutionDetail {
            trigger: Some(NamedResource {
                name: "use-item".to_string(),
                url: String::new(),
            }),
            min_level: None,
            item: Some(NamedResource {
                name: item.to_string(),
                url: String::new(),
            }),
        }
    }

    fn node(
        id: u32,
        name: &str,
        details: Vec<EvolutionDetail>,
        evolves_to: Vec<ChainLink>,
    ) -> ChainLink {
        ChainLink {
            species: species(id, name),
            evolution_details: details,
            evolves_to,
        }
    }

    fn count(link: &ChainLink) -> usize {
        1 + link.evolves_to.iter().map(count).sum::<usize>()
    }

    #[test]
    fn test_single_node() {
        let chain = EvolutionChain {
            chain: Some(node(25, "pikachu", vec![], vec![])),
        };

        assert_eq!(
            flatten(&chain),
            vec![EvolutionEntry {
                species_id: Id(25),
                species_name: "pikachu".to_string(),
                trigger: None,
                min_level: None,
                item: None,
            }]
        );
    }

    #[test]
    fn test_linear_chain() {
        let chain = EvolutionChain {
            chain: Some(node(
                4,
                "charmander",
                vec![],
                vec![node(
                    5,
                    "charmeleon",
                    vec![level_up(16)],
                    vec![node(6, "charizard", vec![level_up(36)], vec![])],
                )],
            )),
        };

        let entries = flatten(&chain);
        let names: Vec<_> = entries.iter().map(|e| e.species_name.as_str()).collect();

        assert_eq!(names, ["charmander", "charmeleon", "charizard"]);
        assert_eq!(entries[0].trigger, None);
        assert_eq!(entries[1].trigger.as_deref(), Some("level-up"));
        assert_eq!(entries[1].min_level, Some(16));
        assert_eq!(entries[2].species_id, Id(6));
        assert_eq!(entries[2].min_level, Some(36));
    }

    #[test]
    fn test_branching_chain_is_pre_order() {
        // oddish -> gloom -> {vileplume, bellossom}; a sibling branch after gloom's subtree
        let root = node(
            43,
            "oddish",
            vec![],
            vec![
                node(
                    44,
                    "gloom",
                    vec![level_up(21)],
                    vec![
                        node(45, "vileplume", vec![use_item("leaf-stone")], vec![]),
                        node(182, "bellossom", vec![use_item("sun-stone")], vec![]),
                    ],
                ),
                node(9999, "sibling", vec![level_up(50)], vec![]),
            ],
        );
        let total = count(&root);
        let chain = EvolutionChain { chain: Some(root) };

        let entries = flatten(&chain);
        let ids: Vec<u32> = entries.iter().map(|e| e.species_id.0).collect();

        assert_eq!(entries.len(), total);
        assert_eq!(ids, [43, 44, 45, 182, 9999]);
        assert_eq!(entries[2].item.as_deref(), Some("leaf-stone"));
        assert_eq!(entries[3].trigger.as_deref(), Some("use-item"));
    }

    #[test]
    fn test_only_first_detail_is_used() {
        let chain = EvolutionChain {
            chain: Some(node(
                133,
                "eevee",
                vec![],
                vec![node(
                    196,
                    "espeon",
                    vec![level_up(1), use_item("sun-stone")],
                    vec![],
                )],
            )),
        };

        let entries = flatten(&chain);

        assert_eq!(entries[1].trigger.as_deref(), Some("level-up"));
        assert_eq!(entries[1].item, None);
    }

    #[test]
    fn test_absent_chain_is_empty() {
        assert!(flatten(&EvolutionChain::default()).is_empty());

        let chain: EvolutionChain = serde_json::from_str("{}").unwrap();
        assert!(flatten(&chain).is_empty());
    }

    #[test]
    fn test_malformed_species_skips_subtree() {
        let mut broken = node(5, "charmeleon", vec![level_up(16)], vec![]);
        broken.species = Some(NamedResource {
            name: "charmeleon".to_string(),
            url: "not-a-url".to_string(),
        });
        broken.evolves_to = vec![node(6, "charizard", vec![level_up(36)], vec![])];

        let chain = EvolutionChain {
            chain: Some(node(
                4,
                "charmander",
                vec![],
                vec![broken, node(999, "other", vec![], vec![])],
            )),
        };

        let ids: Vec<u32> = flatten(&chain).iter().map(|e| e.species_id.0).collect();
        assert_eq!(ids, [4, 999]);
    }

    #[test]
    fn test_flatten_from_payload() {
        let chain: EvolutionChain = serde_json::from_str(
            r#"{
                "id": 10,
                "chain": {
                    "species": {"name": "pichu", "url": "https://pokeapi.co/api/v2/pokemon-species/172/"},
                    "evolution_details": [],
                    "evolves_to": [{
                        "species": {"name": "pikachu", "url": "https://pokeapi.co/api/v2/pokemon-species/25/"},
                        "evolution_details": [{"trigger": {"name": "level-up", "url": ""}, "min_level": null, "item": null, "min_happiness": 220}],
                        "evolves_to": [{
                            "species": {"name": "raichu", "url": "https://pokeapi.co/api/v2/pokemon-species/26/"},
                            "evolution_details": [{"trigger": {"name": "use-item", "url": ""}, "item": {"name": "thunder-stone", "url": ""}}],
                            "evolves_to": []
                        }]
                    }]
                }
            }"#,
        )
        .unwrap();

        let entries = flatten(&chain);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].min_level, None);
        assert_eq!(entries[2].item.as_deref(), Some("thunder-stone"));
        // pure: a second pass yields the same output
        assert_eq!(flatten(&chain), entries);
    }
}
