//! The declared menu: ordered sections of entries, each bound to a module.

use serde::{Deserialize, Serialize};

use metroconsole_auth::{ModuleCatalog, ModuleName};
use metroconsole_core::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub id: String,
    pub label: String,
    /// Module whose `view` grant controls visibility.
    pub module: ModuleName,
}

impl MenuEntry {
    pub fn new(id: impl Into<String>, label: impl Into<String>, module: ModuleName) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            module,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSection {
    pub title: String,
    pub entries: Vec<MenuEntry>,
}

impl MenuSection {
    pub fn new(title: impl Into<String>, entries: Vec<MenuEntry>) -> Self {
        Self {
            title: title.into(),
            entries,
        }
    }
}

/// Ordered menu sections. Declaration order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuCatalog {
    sections: Vec<MenuSection>,
}

impl MenuCatalog {
    pub fn new(sections: Vec<MenuSection>) -> Self {
        Self { sections }
    }

    /// The metrology console menu.
    pub fn standard() -> Self {
        Self::new(vec![
            MenuSection::new(
                "Metrologia",
                vec![
                    MenuEntry::new("equipment", "Equipamentos", ModuleCatalog::EQUIPMENT),
                    MenuEntry::new("calibrations", "Calibrações", ModuleCatalog::CALIBRATION),
                ],
            ),
            MenuSection::new(
                "Monitoramento",
                vec![
                    MenuEntry::new("wells", "Poços", ModuleCatalog::WELLS),
                    MenuEntry::new(
                        "chemical-analysis",
                        "Análises Químicas",
                        ModuleCatalog::CHEMICAL_ANALYSIS,
                    ),
                ],
            ),
            MenuSection::new(
                "Suprimentos",
                vec![
                    MenuEntry::new("stock", "Estoque", ModuleCatalog::STOCK),
                    MenuEntry::new("suppliers", "Fornecedores", ModuleCatalog::SUPPLIERS),
                ],
            ),
            MenuSection::new(
                "Gestão",
                vec![
                    MenuEntry::new("reports", "Relatórios", ModuleCatalog::REPORTS),
                    MenuEntry::new("users", "Usuários", ModuleCatalog::USERS),
                    MenuEntry::new("settings", "Configurações", ModuleCatalog::SETTINGS),
                ],
            ),
        ])
    }

    pub fn sections(&self) -> &[MenuSection] {
        &self.sections
    }

    /// Every entry, in display order.
    pub fn entries(&self) -> impl Iterator<Item = &MenuEntry> {
        self.sections.iter().flat_map(|s| s.entries.iter())
    }

    pub fn find(&self, id: &str) -> Option<&MenuEntry> {
        self.entries().find(|e| e.id == id)
    }

    /// Check that entry ids are unique and every entry names a catalog module.
    pub fn validate(&self, modules: &ModuleCatalog) -> CoreResult<()> {
        let mut seen = std::collections::HashSet::new();
        for entry in self.entries() {
            if !seen.insert(entry.id.as_str()) {
                return Err(CoreError::validation(format!(
                    "duplicate menu entry id: {}",
                    entry.id
                )));
            }
            if !modules.contains(entry.module.as_str()) {
                return Err(CoreError::unknown_module(entry.module.as_str()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_menu_is_valid() {
        MenuCatalog::standard()
            .validate(&ModuleCatalog::standard())
            .unwrap();
    }

    #[test]
    fn standard_menu_covers_every_module() {
        let menu = MenuCatalog::standard();
        for module in ModuleCatalog::standard().iter() {
            assert!(
                menu.entries().any(|e| &e.module == module),
                "no entry for {module}"
            );
        }
    }

    #[test]
    fn unknown_module_is_rejected() {
        let menu = MenuCatalog::new(vec![MenuSection::new(
            "Outros",
            vec![MenuEntry::new("billing", "Faturamento", ModuleName::new("billing"))],
        )]);
        assert_eq!(
            menu.validate(&ModuleCatalog::standard()),
            Err(CoreError::unknown_module("billing"))
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let menu = MenuCatalog::new(vec![MenuSection::new(
            "Dup",
            vec![
                MenuEntry::new("stock", "Estoque", ModuleCatalog::STOCK),
                MenuEntry::new("stock", "Estoque 2", ModuleCatalog::STOCK),
            ],
        )]);
        assert!(matches!(
            menu.validate(&ModuleCatalog::standard()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn catalog_round_trips_as_plain_section_list() {
        let json = r#"[{"title":"Estoque","entries":[{"id":"stock","label":"Estoque","module":"stock"}]}]"#;
        let menu: MenuCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(menu.sections().len(), 1);
        assert_eq!(menu.find("stock").unwrap().module, ModuleCatalog::STOCK);
    }
}
