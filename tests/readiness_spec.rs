use speculate2::speculate;
use stackgen::devserver::{NoiseFilter, ReadinessDetector};

speculate! {
    describe "readiness detection" {
        it "fires when the marker arrives in one chunk" {
            let mut detector = ReadinessDetector::new("compiled successfully");
            assert!(detector.observe("Build done. compiled successfully.\n"));
            assert!(detector.has_fired());
        }

        it "fires when the marker is split across two chunks" {
            let mut detector = ReadinessDetector::new("compiled successfully");
            assert!(!detector.observe("... compiled succ"));
            assert!(detector.observe("essfully in 2.3s\n"));
        }

        it "is invariant under chunk segmentation" {
            let text = "Browser application bundle generation complete.\ncompiled successfully.\nWatching for file changes.\n";
            for split in 1..text.len() {
                let mut detector = ReadinessDetector::new("compiled successfully");
                let firings = [&text[..split], &text[split..]]
                    .iter()
                    .filter(|chunk| detector.observe(chunk))
                    .count();
                assert_eq!(firings, 1, "split at byte {split}");
            }
        }

        it "survives one-byte-at-a-time delivery" {
            let text = "x compiled successfully x";
            let mut detector = ReadinessDetector::new("compiled successfully");
            let mut firings = 0;
            for i in 0..text.len() {
                if detector.observe(&text[i..i + 1]) {
                    firings += 1;
                }
            }
            assert_eq!(firings, 1);
        }

        it "fires at most once even when the marker recurs" {
            let mut detector = ReadinessDetector::new("started");
            assert!(detector.observe("Development server started\n"));
            assert!(!detector.observe("Development server started\n"));
            assert!(!detector.observe("restarted\n"));
            assert!(detector.has_fired());
        }

        it "does not fire without the marker" {
            let mut detector = ReadinessDetector::new("started");
            assert!(!detector.observe("warming up"));
            assert!(!detector.observe("listening soon"));
            assert!(!detector.has_fired());
        }

        it "matches a marker embedded in a longer line" {
            let mut detector = ReadinessDetector::new("started");
            assert!(detector.observe("INFO  Server running ... development server started on port 8000"));
        }

        it "handles multibyte output around a split marker" {
            let mut detector = ReadinessDetector::new("listo");
            assert!(!detector.observe("⚡ casi li"));
            assert!(detector.observe("sto ✓"));
        }

        it "tolerates chunks cut inside multibyte characters of prior text" {
            // The tail is trimmed to a char boundary even when the window
            // ends mid-way through wide characters.
            let mut detector = ReadinessDetector::new("ready");
            assert!(!detector.observe("号号号号号号"));
            assert!(!detector.observe("号号"));
            assert!(detector.observe("号ready"));
        }
    }

    describe "noise filtering" {
        it "flags lines containing a configured pattern" {
            let filter = NoiseFilter::new(vec!["Warning".to_string(), "Debugger".to_string()]);
            assert!(filter.is_noise("Warning: option deprecated"));
            assert!(filter.is_noise("Debugger attached."));
        }

        it "keeps ordinary error lines" {
            let filter = NoiseFilter::new(vec!["Warning".to_string()]);
            assert!(!filter.is_noise("Error: address already in use"));
        }

        it "passes everything when no patterns are configured" {
            let filter = NoiseFilter::default();
            assert!(!filter.is_noise("Warning: would normally be noise"));
        }
    }
}
