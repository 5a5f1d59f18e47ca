//! Mappings command - inspect the effective mapping table
//!
//! This module implements the `mappings` subcommand.

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use fqcn_converter::mapping::MappingTable;
use indexmap::IndexMap;
use std::path::PathBuf;

/// Arguments for the mappings command
#[derive(Parser, Debug, Clone)]
pub struct MappingsArgs {
    /// Resolve a single short name
    #[arg(long, short = 'l')]
    pub lookup: Option<String>,

    /// Only list entries of this collection (e.g. `community.general`)
    #[arg(long)]
    pub collection: Option<String>,

    /// Mapping file replacing the bundled table
    #[arg(long, short = 'm')]
    pub mappings: Option<PathBuf>,
}

impl MappingsArgs {
    /// Execute the mappings command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let table = ctx.mapping_table(self.mappings.as_deref())?;

        if let Some(name) = &self.lookup {
            return Ok(self.lookup(ctx, &table, name));
        }

        let entries = self.entries(&table);
        if ctx.output.is_json() {
            ctx.output.json(&entries)?;
            return Ok(0);
        }

        let rows: Vec<Vec<String>> = entries
            .iter()
            .map(|(short, fqcn)| vec![short.to_string(), fqcn.to_string()])
            .collect();
        ctx.output.table(&["SHORT NAME", "FQCN"], &rows);
        ctx.output.line(&format!("\n{} mapping(s)", rows.len()));
        ctx.output.flush();
        Ok(0)
    }

    fn lookup(&self, ctx: &CommandContext, table: &MappingTable, name: &str) -> i32 {
        match table.lookup(name) {
            Some(fqcn) => {
                if ctx.output.is_json() {
                    let value = serde_json::json!({ "short": name, "fqcn": fqcn });
                    println!("{}", value);
                } else {
                    ctx.output.line(fqcn);
                }
                0
            }
            None => {
                ctx.output
                    .error(&format!("No mapping for '{}'", name));
                1
            }
        }
    }

    fn entries<'t>(&self, table: &'t MappingTable) -> IndexMap<&'t str, &'t str> {
        let prefix = self.collection.as_ref().map(|c| format!("{}.", c));
        table
            .iter()
            .filter(|(_, fqcn)| prefix.as_ref().map_or(true, |p| fqcn.starts_with(p.as_str())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_filter() {
        let table = MappingTable::bundled();
        let args =
            MappingsArgs::try_parse_from(["mappings", "--collection", "ansible.posix"]).unwrap();
        let entries = args.entries(&table);
        assert!(!entries.is_empty());
        assert!(entries.values().all(|f| f.starts_with("ansible.posix.")));
        assert_eq!(entries.get("mount"), Some(&"ansible.posix.mount"));
    }

    #[test]
    fn test_unfiltered_lists_everything() {
        let table = MappingTable::bundled();
        let args = MappingsArgs::try_parse_from(["mappings"]).unwrap();
        assert_eq!(args.entries(&table).len(), table.len());
    }
}
