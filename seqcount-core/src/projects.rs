use crate::error::{SeqError, SeqResult};
use crate::io::csv::read_coordinate_regions;
use crate::io::fasta::read_fasta_records_from_path;
use crate::seq::{RefSeq, SeqRecord};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

#[derive(Clone, Debug, Default)]
pub struct ProjectConfig {
    references: HashMap<String, RefSeq>,
    coordinate_regions: HashMap<String, Vec<String>>,
}

impl ProjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load references from FASTA and seed assignments from a
    /// `seed,coordinate_region` CSV.
    pub fn load(references: impl AsRef<Path>, regions: impl AsRef<Path>) -> SeqResult<Self> {
        let records = read_fasta_records_from_path::<RefSeq>(references)?;
        let regions_path = regions.as_ref();
        let assignments = read_coordinate_regions(
            File::open(regions_path)?,
            &regions_path.display().to_string(),
        )?;
        Self::from_records(records, assignments)
    }

    pub fn from_records(
        records: Vec<SeqRecord<RefSeq>>,
        assignments: Vec<(String, String)>,
    ) -> SeqResult<Self> {
        let mut config = Self::new();
        for record in records {
            let (id, seq) = record.into_parts();
            config.add_reference(id.into_string(), seq);
        }
        for (seed, region) in assignments {
            config.add_coordinate_region(&seed, &region)?;
        }
        Ok(config)
    }

    pub fn add_reference(&mut self, name: impl Into<String>, seq: RefSeq) {
        self.references.insert(name.into(), seq);
    }

    /// Assign a coordinate region to a seed. Both must already be known.
    /// Repeated assignments keep their first position.
    pub fn add_coordinate_region(&mut self, seed: &str, region: &str) -> SeqResult<()> {
        self.reference(seed)?;
        self.reference(region)?;
        let regions = self.coordinate_regions.entry(seed.to_string()).or_default();
        if !regions.iter().any(|r| r == region) {
            regions.push(region.to_string());
        }
        Ok(())
    }

    pub fn reference(&self, name: &str) -> SeqResult<&RefSeq> {
        self.references
            .get(name)
            .ok_or_else(|| SeqError::UnknownReference {
                name: name.to_string(),
            })
    }

    /// Coordinate references for a seed, in assignment order.
    pub fn coordinate_references(&self, seed: &str) -> SeqResult<Vec<(&str, &RefSeq)>> {
        let Some(regions) = self.coordinate_regions.get(seed) else {
            return Ok(Vec::new());
        };
        regions
            .iter()
            .map(|region| Ok((region.as_str(), self.reference(region)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config() -> ProjectConfig {
        let mut config = ProjectConfig::new();
        config.add_reference("R1-seed", RefSeq::new(b"AAATTTGCT".to_vec()).unwrap());
        config.add_reference("R1", RefSeq::new(b"KFA".to_vec()).unwrap());
        config.add_reference("R1b", RefSeq::new(b"FA".to_vec()).unwrap());
        config
    }

    #[test]
    fn coordinate_references_keep_assignment_order() {
        let mut config = config();
        config.add_coordinate_region("R1-seed", "R1b").unwrap();
        config.add_coordinate_region("R1-seed", "R1").unwrap();
        config.add_coordinate_region("R1-seed", "R1b").unwrap();
        let names: Vec<&str> = config
            .coordinate_references("R1-seed")
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["R1b", "R1"]);
        assert!(config.coordinate_references("R1").unwrap().is_empty());
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut config = config();
        assert!(matches!(
            config.add_coordinate_region("R1-seed", "R9"),
            Err(SeqError::UnknownReference { name }) if name == "R9"
        ));
        assert!(config.reference("nope").is_err());
    }

    #[test]
    fn load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("refs.fasta");
        let regions = dir.path().join("regions.csv");
        std::fs::File::create(&fasta)
            .unwrap()
            .write_all(b">R1-seed\nAAATTTGCT\n>R1\nKFA\n")
            .unwrap();
        std::fs::write(&regions, "seed,coordinate_region\nR1-seed,R1\n").unwrap();

        let config = ProjectConfig::load(&fasta, &regions).unwrap();
        let refs = config.coordinate_references("R1-seed").unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].1.as_bytes(), b"KFA");
    }
}
