#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use anyhow::anyhow;
    use kodegen_bundler_app::pipeline::{Pipeline, PipelineState, StageKind};

    #[tokio::test]
    async fn test_build_failure_skips_bundle() {
        let bundled = AtomicBool::new(false);

        let result = Pipeline::compose(
            false,
            async { Err(anyhow!("linker exploded")) },
            async {
                bundled.store(true, Ordering::SeqCst);
                Ok(())
            },
        )
        .run()
        .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.stage, StageKind::Build);
        assert!(failure.source.to_string().contains("linker exploded"));
        assert!(failure.to_string().starts_with("build stage failed"));
        assert!(!bundled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_build_failure_leaves_no_bundle_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let bundle_path = dir.path().join("Demo.app");

        let result = Pipeline::compose(
            false,
            async { Err(anyhow!("compile error")) },
            async {
                tokio::fs::create_dir_all(&bundle_path).await?;
                Ok::<(), anyhow::Error>(())
            },
        )
        .run()
        .await;

        assert!(result.is_err());
        assert!(!bundle_path.exists());
    }

    #[tokio::test]
    async fn test_skip_build_runs_bundle_only() {
        let built = AtomicBool::new(false);
        let bundled = AtomicBool::new(false);

        let pipeline = Pipeline::compose(
            true,
            async {
                built.store(true, Ordering::SeqCst);
                Ok(())
            },
            async {
                bundled.store(true, Ordering::SeqCst);
                Ok(())
            },
        );
        assert_eq!(pipeline.stage_kinds(), vec![StageKind::Bundle]);

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.stages, vec![StageKind::Bundle]);
        assert!(!built.load(Ordering::SeqCst));
        assert!(bundled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_observer_sees_successful_transitions() {
        let mut states = Vec::new();

        let report = Pipeline::compose(false, async { Ok(()) }, async { Ok(()) })
            .on_transition(|state| states.push(state.clone()))
            .run()
            .await
            .unwrap();

        assert_eq!(report.stages, vec![StageKind::Build, StageKind::Bundle]);
        assert_eq!(
            states,
            vec![
                PipelineState::Building,
                PipelineState::Bundling,
                PipelineState::Succeeded
            ]
        );
    }

    #[tokio::test]
    async fn test_observer_sees_bundle_failure() {
        let mut states = Vec::new();

        let failure = Pipeline::compose(false, async { Ok(()) }, async {
            Err(anyhow!("executable missing"))
        })
        .on_transition(|state| states.push(state.clone()))
        .run()
        .await
        .unwrap_err();

        assert_eq!(failure.stage, StageKind::Bundle);
        assert_eq!(
            states.last(),
            Some(&PipelineState::Failed {
                stage: StageKind::Bundle,
                error: "executable missing".to_string(),
            })
        );
        assert_eq!(states.len(), 3);
    }

    #[tokio::test]
    async fn test_elapsed_covers_all_stages() {
        let report = Pipeline::compose(
            false,
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(())
            },
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(())
            },
        )
        .run()
        .await
        .unwrap();

        assert!(report.elapsed >= Duration::from_millis(40));
    }
}
