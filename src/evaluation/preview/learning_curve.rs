use crate::evaluation::preview::snapshot::Snapshot;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Error, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveFormat {
    Csv,
    Tsv,
    Json,
}

const BASE_COLUMNS: [&str; 5] = ["instances_seen", "accuracy", "kappa", "ram_hours", "seconds"];

/// Snapshots taken along one run, oldest first.
#[derive(Debug, Clone, Default)]
pub struct LearningCurve {
    snapshots: Vec<Snapshot>,
}

impl LearningCurve {
    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    pub fn export(&self, path: &Path, format: CurveFormat) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer, format)?;
        writer.flush()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W, format: CurveFormat) -> Result<(), Error> {
        match format {
            CurveFormat::Csv => self.write_delimited(writer, ','),
            CurveFormat::Tsv => self.write_delimited(writer, '\t'),
            CurveFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, &self.snapshots)?;
                writeln!(writer)
            }
        }
    }

    /// One column per base metric, then one per extra seen in any snapshot.
    /// Extras a snapshot lacks are left empty.
    fn write_delimited<W: Write>(&self, writer: &mut W, delimiter: char) -> Result<(), Error> {
        let extras: BTreeSet<&str> = self
            .snapshots
            .iter()
            .flat_map(|s| s.extras.keys().map(String::as_str))
            .collect();

        let header: Vec<&str> = BASE_COLUMNS.iter().copied().chain(extras.iter().copied()).collect();
        writeln!(writer, "{}", header.join(&delimiter.to_string()))?;

        for s in &self.snapshots {
            let mut row = vec![
                s.instances_seen.to_string(),
                s.accuracy.to_string(),
                s.kappa.to_string(),
                s.ram_hours.to_string(),
                s.seconds.to_string(),
            ];
            row.extend(
                extras
                    .iter()
                    .map(|k| s.extras.get(*k).map(f64::to_string).unwrap_or_default()),
            );
            writeln!(writer, "{}", row.join(&delimiter.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    fn snapshot(seen: u64, extras: &[(&str, f64)]) -> Snapshot {
        Snapshot {
            instances_seen: seen,
            accuracy: 0.5,
            kappa: 0.25,
            ram_hours: 0.0,
            seconds: 2.0,
            extras: extras
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn curve() -> LearningCurve {
        let mut curve = LearningCurve::default();
        curve.push(snapshot(10, &[("f1", 0.5)]));
        curve.push(snapshot(20, &[("f1", 0.75), ("precision", 1.0)]));
        curve
    }

    #[test]
    fn csv_has_union_of_extras() {
        let mut out = Vec::new();
        curve().write_to(&mut out, CurveFormat::Csv).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "instances_seen,accuracy,kappa,ram_hours,seconds,f1,precision",
                "10,0.5,0.25,0,2,0.5,",
                "20,0.5,0.25,0,2,0.75,1",
            ]
        );
    }

    #[test]
    fn tsv_uses_tabs() {
        let mut out = Vec::new();
        curve().write_to(&mut out, CurveFormat::Tsv).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("instances_seen\taccuracy\t"));
    }

    #[test]
    fn json_export_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("curve.json");
        curve().export(&path, CurveFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[1]["instances_seen"], 20);
        assert_eq!(parsed[1]["extras"]["precision"], 1.0);
    }

    #[test]
    fn latest_and_len() {
        let c = curve();
        assert_eq!(c.len(), 2);
        assert_eq!(c.latest().unwrap().instances_seen, 20);
        assert!(LearningCurve::default().is_empty());
    }
}
