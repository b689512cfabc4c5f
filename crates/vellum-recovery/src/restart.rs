//! Per-component restart action table.

/// Map a component name to the concrete restart action the host should
/// perform. Component names are matched exactly except for the `Network`
/// prefix rule, which covers any networking-adjacent component.
#[must_use]
pub fn restart_action_for(component: &str) -> &'static str {
    match component {
        "WhisperEngine" => "reload_models",
        "MediaPipeline" => "reinitialize_libraries",
        "TorrentEngine" => "restart_session",
        "StorageLayer" => "reconnect_database",
        other if other.starts_with("Network") => "reset_connections",
        _ => "generic_restart",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_components() {
        assert_eq!(restart_action_for("WhisperEngine"), "reload_models");
        assert_eq!(restart_action_for("MediaPipeline"), "reinitialize_libraries");
        assert_eq!(restart_action_for("TorrentEngine"), "restart_session");
        assert_eq!(restart_action_for("StorageLayer"), "reconnect_database");
        assert_eq!(restart_action_for("NetworkMonitor"), "reset_connections");
    }

    #[test]
    fn unknown_component_gets_generic_restart() {
        assert_eq!(restart_action_for("SomethingElse"), "generic_restart");
    }
}
