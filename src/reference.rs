use crate::error::{Error, Result};
use crate::table::Page;
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The ordered list of page references a simulation replays. Every value is checked against the
/// page space when the sequence is built, so an engine holding one never sees an out-of-range
/// reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSequence {
    pages: Vec<Page>,
    page_count: usize,
}

impl ReferenceSequence {
    /// Validate raw page indices against `[0, page_count)` and wrap them. Fails on the first
    /// out-of-range value; nothing is partially accepted.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidReference` naming the offending value.
    pub fn build(values: &[usize], page_count: usize) -> Result<Self> {
        let pages = values
            .iter()
            .map(|&reference| match reference < page_count {
                true => Ok(Page(reference)),
                false => Err(Error::InvalidReference {
                    reference,
                    page_count,
                }),
            })
            .collect::<Result<Vec<Page>>>()?;
        Ok(Self { pages, page_count })
    }

    /// Draw `length` references uniformly from the page space using the caller's randomness.
    pub fn generate<R: Rng>(rng: &mut R, page_count: usize, length: usize) -> Result<Self> {
        if page_count == 0 {
            return Err(Error::InvalidConfig(String::from(
                "cannot generate references over an empty page space",
            )));
        }
        let values: Vec<usize> = (0..length)
            .map(|_| rng.random_range(0..page_count))
            .collect();
        Self::build(&values, page_count)
    }

    /// Parse a list of page indices separated by commas and/or whitespace.
    pub fn parse(text: &str, page_count: usize) -> Result<Self> {
        let values = parse_values(text)?;
        Self::build(&values, page_count)
    }

    /// Read a reference file, one or more whitespace separated page indices per line. Blank lines
    /// are skipped.
    pub fn read<P: AsRef<Path>>(path: P, page_count: usize) -> Result<Self> {
        let reader = ReferenceReader::new(path)?;
        let mut values = Vec::new();
        for line in reader {
            values.extend(line?);
        }
        Self::build(&values, page_count)
    }

    pub fn get(&self, index: usize) -> Option<Page> {
        self.pages.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn as_slice(&self) -> &[Page] {
        &self.pages
    }

    /// Position of the first occurrence of `page` anywhere in the sequence.
    pub fn first_occurrence(&self, page: Page) -> Option<usize> {
        self.pages.iter().position(|&p| p == page)
    }

    /// The references from `start` onwards; empty once `start` runs past the end.
    pub fn window(&self, start: usize) -> &[Page] {
        &self.pages[start.min(self.pages.len())..]
    }
}

fn parse_values(text: &str) -> Result<Vec<usize>> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<usize>()
                .map_err(|_| Error::ParseReference(String::from(token)))
        })
        .collect()
}

/// `ReferenceReader` sequentially obtains page indices from a text file, yielding the values
/// found on each line.
pub struct ReferenceReader {
    reader: BufReader<File>,
    pub line_number: u64,
}

impl ReferenceReader {
    /// Open the reference file at `path`.
    ///
    /// # Errors
    ///
    /// Fails with `Error::Io` if the file does not exist or cannot be opened.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            line_number: 0,
        })
    }
}

impl Iterator for ReferenceReader {
    type Item = Result<Vec<usize>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buffer = String::new();
        match self.reader.read_line(&mut buffer) {
            Err(err) => Some(Err(Error::from(err))),
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                Some(parse_values(buffer.trim()))
            }
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    #[cfg(test)]
    mod reference_sequence_tests {

        use super::*;

        #[test]
        fn build() {
            let sequence = ReferenceSequence::build(&[0, 1, 0, 3], 4).unwrap();
            assert_eq!(sequence.len(), 4);
            assert_eq!(sequence.get(3), Some(Page(3)));
            assert_eq!(sequence.get(4), None);
        }

        #[test]
        fn build_rejects_out_of_range() {
            let result = ReferenceSequence::build(&[0, 1, 4, 2], 4);
            assert!(matches!(
                result,
                Err(Error::InvalidReference {
                    reference: 4,
                    page_count: 4
                })
            ));
        }

        #[test]
        fn generate_stays_in_range() {
            let mut rng = StdRng::seed_from_u64(7);
            let sequence = ReferenceSequence::generate(&mut rng, 15, 200).unwrap();
            assert_eq!(sequence.len(), 200);
            assert!(sequence.as_slice().iter().all(|page| page.index() < 15));
        }

        #[test]
        fn generate_is_seeded() {
            let a = ReferenceSequence::generate(&mut StdRng::seed_from_u64(3), 15, 19).unwrap();
            let b = ReferenceSequence::generate(&mut StdRng::seed_from_u64(3), 15, 19).unwrap();
            assert_eq!(a, b);
        }

        #[test]
        fn generate_empty_page_space() {
            let mut rng = StdRng::seed_from_u64(7);
            assert!(ReferenceSequence::generate(&mut rng, 0, 5).is_err());
        }

        #[test]
        fn parse() {
            let sequence = ReferenceSequence::parse("0, 1 0,2  1,3", 4).unwrap();
            let pages: Vec<usize> = sequence.as_slice().iter().map(Page::index).collect();
            assert_eq!(pages, vec![0, 1, 0, 2, 1, 3]);
        }

        #[test]
        fn parse_rejects_garbage() {
            assert!(matches!(
                ReferenceSequence::parse("0,x,1", 4),
                Err(Error::ParseReference(token)) if token == "x"
            ));
        }

        #[test]
        fn first_occurrence_and_window() {
            let sequence = ReferenceSequence::build(&[2, 1, 2, 3], 4).unwrap();
            assert_eq!(sequence.first_occurrence(Page(2)), Some(0));
            assert_eq!(sequence.first_occurrence(Page(0)), None);
            assert_eq!(sequence.window(2), &[Page(2), Page(3)]);
            assert!(sequence.window(9).is_empty());
        }
    }

    #[cfg(test)]
    mod reference_reader_tests {

        use super::*;

        #[test]
        fn read() {
            let path = std::env::temp_dir().join("paging_sim_reference_reader_test.txt");
            let mut file = File::create(&path).unwrap();
            writeln!(file, "0 1").unwrap();
            writeln!(file).unwrap();
            writeln!(file, "0 2 1").unwrap();
            writeln!(file, "3").unwrap();

            let mut reader = ReferenceReader::new(&path).unwrap();
            assert_eq!(reader.next().unwrap().unwrap(), vec![0, 1]);
            assert_eq!(reader.line_number, 1);

            let sequence = ReferenceSequence::read(&path, 4).unwrap();
            assert_eq!(sequence.len(), 6);
            std::fs::remove_file(&path).unwrap();
        }

        #[test]
        fn missing_file() {
            assert!(matches!(
                ReferenceReader::new("does/not/exist.txt"),
                Err(Error::Io(_))
            ));
        }
    }
}
