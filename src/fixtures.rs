#[cfg(test)]
pub mod test {
    use rust_embed::Embed;
    use serde::{Deserialize, Serialize};

    use crate::app::AppInfo;

    /// Resources bundled for tests, read from `fixtures/bundle/`.
    #[derive(Embed)]
    #[folder = "fixtures/bundle/"]
    pub struct Bundle;

    /// A record-shaped value stored whole in configs.
    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct Window {
        pub title: String,
        pub width: u32,
        pub height: u32,
        pub maximized: bool,
    }

    pub fn sample_window() -> Window {
        Window {
            title: "Main <editor>".into(),
            width: 1280,
            height: 720,
            maximized: true,
        }
    }

    pub fn sample_app() -> AppInfo {
        AppInfo::new("Launcher", "1.2.0").unwrap()
    }

    #[test]
    fn bundle_contains_defaults() {
        for name in ["default.json", "default.properties", "default.toml"] {
            assert!(Bundle::get(name).is_some(), "{name} missing from bundle");
        }
    }
}
