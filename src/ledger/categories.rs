// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Category forest. Stored as rows with a parent id; walked as an arena.

use std::collections::{HashMap, HashSet};

use rusqlite::{params, Connection, OptionalExtension};

use super::require_name;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Category, CategoryType};

pub const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub r#type: CategoryType,
    pub parent_id: Option<i64>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
}

/// All categories keyed by id.
#[derive(Debug, Default)]
pub struct CategoryTree {
    nodes: HashMap<i64, Category>,
}

impl CategoryTree {
    pub fn load(conn: &Connection) -> LedgerResult<Self> {
        let categories = list_categories(conn, true)?;
        Ok(Self::from_categories(categories))
    }

    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        CategoryTree {
            nodes: categories.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn get(&self, id: i64) -> Option<&Category> {
        self.nodes.get(&id)
    }

    /// Root-first chain of categories ending at `id`.
    pub fn ancestry(&self, id: i64) -> LedgerResult<Vec<&Category>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = Some(id);
        while let Some(cid) = cursor {
            if !seen.insert(cid) {
                return Err(LedgerError::Inconsistency(format!(
                    "category {} is part of a parent cycle",
                    id
                )));
            }
            let node = self
                .nodes
                .get(&cid)
                .ok_or_else(|| LedgerError::not_found("category", cid))?;
            chain.push(node);
            cursor = node.parent_id;
        }
        chain.reverse();
        Ok(chain)
    }

    pub fn full_path(&self, id: i64) -> LedgerResult<String> {
        let names: Vec<&str> = self
            .ancestry(id)?
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        Ok(names.join(PATH_SEPARATOR))
    }

    /// True when `ancestor` sits on the parent chain of `id` (or is `id`).
    pub fn is_ancestor_or_self(&self, ancestor: i64, id: i64) -> LedgerResult<bool> {
        Ok(self.ancestry(id)?.iter().any(|c| c.id == ancestor))
    }

    /// Every category with its full path, sorted by path.
    pub fn paths(&self) -> LedgerResult<Vec<(String, &Category)>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for c in self.nodes.values() {
            out.push((self.full_path(c.id)?, c));
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    /// Finds a category by "A > B" path or by a name unique in the tree.
    pub fn resolve(&self, key: &str) -> LedgerResult<&Category> {
        let key = key.trim();
        if key.contains('>') {
            let wanted: Vec<&str> = key.split('>').map(str::trim).collect();
            let wanted = wanted.join(PATH_SEPARATOR);
            for (path, c) in self.paths()? {
                if path == wanted {
                    return Ok(c);
                }
            }
            return Err(LedgerError::not_found("category", key));
        }
        let matches: Vec<&Category> = self.nodes.values().filter(|c| c.name == key).collect();
        match matches.as_slice() {
            [] => Err(LedgerError::not_found("category", key)),
            [one] => Ok(one),
            _ => Err(LedgerError::validation(format!(
                "category name '{}' is ambiguous; use the full path",
                key
            ))),
        }
    }
}

fn name_taken(
    conn: &Connection,
    name: &str,
    parent_id: Option<i64>,
    except: Option<i64>,
) -> LedgerResult<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories WHERE name=?1 AND parent_id IS ?2 AND (?3 IS NULL OR id<>?3)",
            params![name, parent_id, except],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

pub fn create_category(conn: &Connection, new: &NewCategory) -> LedgerResult<Category> {
    let name = require_name(&new.name, "category name")?;
    if let Some(pid) = new.parent_id {
        get_category(conn, pid)?;
    }
    if name_taken(conn, &name, new.parent_id, None)? {
        return Err(LedgerError::validation(format!(
            "category '{}' already exists under this parent",
            name
        )));
    }
    conn.execute(
        "INSERT INTO categories(name, type, parent_id, icon, color, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            name,
            new.r#type,
            new.parent_id,
            new.icon,
            new.color,
            new.description
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(category_id = id, %name, parent = ?new.parent_id, "category created");
    get_category(conn, id)
}

pub fn get_category(conn: &Connection, id: i64) -> LedgerResult<Category> {
    conn.query_row(
        &format!("SELECT {} FROM categories WHERE id=?1", Category::COLUMNS),
        params![id],
        Category::from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("category", id))
}

pub fn list_categories(conn: &Connection, include_inactive: bool) -> LedgerResult<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM categories WHERE (?1 OR is_active=1) ORDER BY name",
        Category::COLUMNS
    ))?;
    let rows = stmt.query_map(params![include_inactive], Category::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn full_path(conn: &Connection, id: i64) -> LedgerResult<String> {
    CategoryTree::load(conn)?.full_path(id)
}

pub fn resolve_category(conn: &Connection, key: &str) -> LedgerResult<Category> {
    let tree = CategoryTree::load(conn)?;
    tree.resolve(key).cloned()
}

/// Re-parents a category. Refuses moves that would put the category under
/// itself or one of its descendants.
pub fn move_category(conn: &Connection, id: i64, new_parent: Option<i64>) -> LedgerResult<Category> {
    let tree = CategoryTree::load(conn)?;
    let node = tree
        .get(id)
        .ok_or_else(|| LedgerError::not_found("category", id))?;
    if let Some(pid) = new_parent {
        if tree.get(pid).is_none() {
            return Err(LedgerError::not_found("category", pid));
        }
        if tree.is_ancestor_or_self(id, pid)? {
            return Err(LedgerError::validation(format!(
                "moving '{}' under {} would make it its own ancestor",
                node.name, pid
            )));
        }
    }
    if name_taken(conn, &node.name, new_parent, Some(id))? {
        return Err(LedgerError::validation(format!(
            "category '{}' already exists under the new parent",
            node.name
        )));
    }
    conn.execute(
        "UPDATE categories SET parent_id=?2 WHERE id=?1",
        params![id, new_parent],
    )?;
    tracing::info!(category_id = id, parent = ?new_parent, "category moved");
    get_category(conn, id)
}

pub fn set_category_active(conn: &Connection, id: i64, active: bool) -> LedgerResult<()> {
    let n = conn.execute(
        "UPDATE categories SET is_active=?2 WHERE id=?1",
        params![id, active],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("category", id));
    }
    Ok(())
}
