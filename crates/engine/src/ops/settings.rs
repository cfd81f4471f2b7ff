use crate::{ResultEngine, Settings, SettingsPatch};

use super::Engine;

impl Engine {
    /// Stored settings merged over the defaults.
    pub async fn settings(&self) -> Settings {
        self.load().await.settings
    }

    /// Shallow-merges `patch` into the stored settings.
    pub async fn save_settings(&self, patch: SettingsPatch) -> ResultEngine<Settings> {
        self.mutate("save_settings", move |doc, _| {
            doc.settings.apply(patch)?;
            Ok(doc.settings.clone())
        })
        .await
    }

    pub async fn reset_settings(&self) -> ResultEngine<Settings> {
        self.mutate("reset_settings", |doc, _| {
            doc.settings = Settings::default();
            Ok(doc.settings.clone())
        })
        .await
    }
}
