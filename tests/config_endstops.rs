// End-to-end: configuration file -> registry -> wait

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use std::num::NonZeroU32;
    use std::sync::Arc;

    use endstop_host::endstop_wait::DwellPolicy;
    use endstop_host::{
        EndstopRegistry, EndstopResolver, EndstopWaiter, PrinterHost, SimClock, WaitRequest,
        WaitTermination, load_config,
    };
    use tempfile::tempdir;

    const CONFIG: &str = r#"
[host]
name = "toolchanger"
liveness = "require_ready"

[wait]
bounded_dwell = 0.25

[endstops.probe]
pin = "!PA1"
samples = [true, true, false]

[endstops."manual_stepper tool_lock"]
pin = "PB4"
level = true
"#;

    #[tokio::test]
    async fn test_configured_endstops_wait() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("printer.toml");
        let mut file = File::create(&path).unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        file.flush().unwrap();

        let config = load_config(&path).unwrap();
        let registry = Arc::new(EndstopRegistry::from_config(&config.endstops));
        assert_eq!(
            registry.names(),
            vec!["manual_stepper tool_lock".to_string(), "probe".to_string()]
        );

        let clock = SimClock::new();
        let host = Arc::new(PrinterHost::new(config.host.initial_state, config.host.liveness));
        let waiter = EndstopWaiter::new(registry, Arc::new(clock.clone()), host)
            .with_dwell(DwellPolicy::from(&config.wait));

        // Inverted pin: raw high reads as not triggered until the third sample
        let outcome = waiter
            .wait_for_state(&WaitRequest::bounded("probe", true, NonZeroU32::new(5).unwrap()))
            .await
            .unwrap();
        assert_eq!(outcome.reason, WaitTermination::Matched);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(clock.wake_requests(), vec![0.25, 0.5]);

        let outcome = waiter
            .wait_for_state(&WaitRequest::continuous("manual_stepper tool_lock", true))
            .await
            .unwrap();
        assert!(outcome.final_triggered);

        let status = serde_json::to_value(waiter.get_status()).unwrap();
        assert_eq!(
            status,
            serde_json::json!({
                "last_endstop_query": { "manual_stepper tool_lock": true, "probe": true }
            })
        );
    }
}
