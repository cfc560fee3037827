//! Favorite Drawing Tools
//!
//! Tool catalog types and the projection of a favorites list onto it.

use std::sync::Arc;

/// A drawing tool offered by the chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub id: String,
    /// Icon glyph name understood by the renderer
    pub icon: String,
    pub label: String,
}

impl ToolDescriptor {
    pub fn new(id: &str, icon: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            icon: icon.to_string(),
            label: label.to_string(),
        }
    }
}

/// A named group of tools, as shown in the side toolbar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolGroup {
    pub name: String,
    pub items: Vec<ToolDescriptor>,
}

/// Immutable, shared tool catalog.
///
/// Two catalogs are the same catalog only if they share storage; building a
/// new catalog with equal contents counts as a change.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    groups: Arc<[ToolGroup]>,
}

impl ToolCatalog {
    pub fn new(groups: Vec<ToolGroup>) -> Self {
        Self {
            groups: groups.into(),
        }
    }

    pub fn groups(&self) -> &[ToolGroup] {
        &self.groups
    }

    pub fn same_as(&self, other: &ToolCatalog) -> bool {
        Arc::ptr_eq(&self.groups, &other.groups)
    }

    /// All tools, group by group
    pub fn flatten(&self) -> Vec<ToolDescriptor> {
        self.groups
            .iter()
            .flat_map(|group| group.items.iter().cloned())
            .collect()
    }
}

/// Drawing tools shipped with the chart
pub fn default_catalog() -> ToolCatalog {
    let group = |name: &str, items: &[(&str, &str, &str)]| ToolGroup {
        name: name.to_string(),
        items: items
            .iter()
            .map(|(id, icon, label)| ToolDescriptor::new(id, icon, label))
            .collect(),
    };

    ToolCatalog::new(vec![
        group(
            "Lines",
            &[
                ("trendline", "trend-line", "Trend Line"),
                ("ray", "ray", "Ray"),
                ("horizontal_line", "horizontal-line", "Horizontal Line"),
                ("vertical_line", "vertical-line", "Vertical Line"),
                ("parallel_channel", "parallel-channel", "Parallel Channel"),
            ],
        ),
        group(
            "Fibonacci",
            &[
                ("fib_retracement", "fib-retracement", "Fib Retracement"),
                ("fib_extension", "fib-extension", "Trend-Based Fib Extension"),
            ],
        ),
        group(
            "Shapes",
            &[
                ("rectangle", "rectangle", "Rectangle"),
                ("circle", "circle", "Circle"),
                ("path", "path", "Path"),
            ],
        ),
        group(
            "Annotations",
            &[
                ("text", "text", "Text"),
                ("arrow", "arrow", "Arrow"),
                ("price_range", "price-range", "Price Range"),
            ],
        ),
    ])
}

/// Memoised lookup of favorite ids in a catalog.
///
/// Recomputes only when the favorites list or the catalog changes.
#[derive(Debug, Default)]
pub struct FavoritesProjection {
    cached: Option<CachedProjection>,
    computations: usize,
}

#[derive(Debug)]
struct CachedProjection {
    favorites: Vec<String>,
    catalog: ToolCatalog,
    tools: Vec<ToolDescriptor>,
}

impl FavoritesProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tools for `favorites`, in favorites order, unknown ids dropped
    pub fn resolve(&mut self, favorites: &[String], catalog: &ToolCatalog) -> &[ToolDescriptor] {
        let fresh = matches!(
            &self.cached,
            Some(c) if c.catalog.same_as(catalog) && c.favorites == favorites
        );

        if !fresh {
            self.computations += 1;
            tracing::debug!("Rebuilding favorites projection (#{})", self.computations);
            self.cached = Some(CachedProjection {
                favorites: favorites.to_vec(),
                catalog: catalog.clone(),
                tools: project(favorites, catalog),
            });
        }

        match &self.cached {
            Some(c) => &c.tools,
            None => &[],
        }
    }

    /// How many times the projection was rebuilt
    #[cfg(test)]
    pub fn computations(&self) -> usize {
        self.computations
    }
}

fn project(favorites: &[String], catalog: &ToolCatalog) -> Vec<ToolDescriptor> {
    if favorites.is_empty() {
        return Vec::new();
    }
    let all_tools = catalog.flatten();
    favorites
        .iter()
        .filter_map(|id| all_tools.iter().find(|tool| &tool.id == id).cloned())
        .collect()
}
