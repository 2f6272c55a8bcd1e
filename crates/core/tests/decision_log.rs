use std::{num::NonZeroU32, sync::Mutex};

use arkangel_core::{
    Detection, FrameRead, FrameSource, NullSink, Result, Verdict, VerdictSequence, play,
};
use image::RgbImage;
use log::{Level, Log, Metadata, Record};

/// Keeps every record from this crate so the per-second lines can be checked.
struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if record.target().starts_with("arkangel_core") {
            if let Ok(mut records) = self.records.lock() {
                records.push((record.level(), record.args().to_string()));
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};

struct BlankFrames(usize);

impl FrameSource for BlankFrames {
    async fn read_frame(&mut self) -> Result<FrameRead> {
        if self.0 == 0 {
            return Ok(FrameRead::EndOfStream);
        }
        self.0 -= 1;
        Ok(FrameRead::Frame(RgbImage::new(4, 4)))
    }
}

#[tokio::test]
async fn one_line_per_second_names_the_category() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(log::LevelFilter::Trace);

    let verdicts = VerdictSequence::new(vec![
        Verdict::clean(),
        Verdict {
            gore: Detection::new(true, 0.93),
            ..Verdict::clean()
        },
    ]);
    let fps = NonZeroU32::new(2).unwrap();

    play(&mut BlankFrames(6), &mut NullSink, &verdicts, fps)
        .await
        .unwrap();

    let records = LOGGER.records.lock().unwrap();
    let seconds: Vec<_> = records
        .iter()
        .filter(|(_, line)| line.contains(" second "))
        .collect();

    assert_eq!(
        seconds,
        vec![
            &(Level::Info, "[00:00] second 0: clean".to_string()),
            &(
                Level::Warn,
                "[00:01] second 1: blur: gore detected (confidence 0.93)".to_string()
            ),
            &(
                Level::Info,
                "[00:02] second 2: no verdict, stopping playback".to_string()
            ),
        ]
    );
}
