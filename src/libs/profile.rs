use anyhow::Context;
use std::collections::BTreeMap;
use std::fmt;
use std::io::BufRead;
use std::io::Write;
use std::ops::Sub;

/// A half-open genomic interval on one haplotype.
///
/// Bins order lexicographically by (chromosome, allele, start, end), which is
/// the order every profile operation in this crate relies on.
///
/// # Example
/// ```
/// use cnp::libs::profile::GenomicBin;
/// let bin = GenomicBin::new("chr1", "a", 0, 5000);
/// assert_eq!(bin.to_string(), "chr1:a:0-5000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenomicBin {
    pub chromosome: String,
    pub allele: String,
    pub start: i32,
    pub end: i32,
}

impl GenomicBin {
    pub fn new(chromosome: impl Into<String>, allele: impl Into<String>, start: i32, end: i32) -> Self {
        Self {
            chromosome: chromosome.into(),
            allele: allele.into(),
            start,
            end,
        }
    }
}

impl fmt::Display for GenomicBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}",
            self.chromosome, self.allele, self.start, self.end
        )
    }
}

/// Absolute integer copy number per bin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyNumberProfile {
    pub bins: Vec<GenomicBin>,
    pub profile: Vec<i32>,
}

/// First-difference encoding of a copy-number profile.
///
/// Within each (chromosome, allele) group the value at index `i` encodes the
/// transition into bin `i`: the first bin holds `cn[0] - diploid`, interior
/// bins hold `cn[i] - cn[i-1]`, and the last bin holds the closure term
/// `diploid - cn[last]` (the exit back to baseline).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakpointProfile {
    pub bins: Vec<GenomicBin>,
    pub profile: Vec<i32>,
}

impl BreakpointProfile {
    /// L1 distance from the all-zero profile.
    pub fn magnitude(&self) -> i64 {
        self.profile.iter().map(|&v| (v as i64).abs()).sum()
    }

    /// Breakpoint distance to another profile over the same bin sequence.
    pub fn distance(&self, other: &BreakpointProfile) -> i64 {
        (self - other).magnitude()
    }
}

impl Sub for &BreakpointProfile {
    type Output = BreakpointProfile;

    fn sub(self, rhs: &BreakpointProfile) -> BreakpointProfile {
        debug_assert_eq!(self.bins, rhs.bins, "profiles must share a bin sequence");
        BreakpointProfile {
            bins: self.bins.clone(),
            profile: self
                .profile
                .iter()
                .zip(rhs.profile.iter())
                .map(|(a, b)| a - b)
                .collect(),
        }
    }
}

/// Partition parallel (bins, values) vectors by (chromosome, allele), keeping
/// groups in map order, and sort each group by bin.
fn group_sorted(
    bins: &[GenomicBin],
    values: &[i32],
) -> BTreeMap<(String, String), (Vec<GenomicBin>, Vec<i32>)> {
    let mut groups: BTreeMap<(String, String), Vec<(GenomicBin, i32)>> = BTreeMap::new();
    for (bin, &value) in bins.iter().zip(values.iter()) {
        groups
            .entry((bin.chromosome.clone(), bin.allele.clone()))
            .or_default()
            .push((bin.clone(), value));
    }

    groups
        .into_iter()
        .map(|(key, mut pairs)| {
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            let (bins, values) = pairs.into_iter().unzip();
            (key, (bins, values))
        })
        .collect()
}

/// Convert a copy-number profile to its breakpoint encoding.
///
/// Bins are grouped by (chromosome, allele) and sorted within each group;
/// groups concatenate in map order. A single-bin group uses the first-bin
/// rule `bp[0] = cn[0] - diploid_cn`.
pub fn to_breakpoint(p: &CopyNumberProfile, diploid_cn: i32) -> BreakpointProfile {
    let mut bp = BreakpointProfile::default();
    for (_, (bins, cn)) in group_sorted(&p.bins, &p.profile) {
        let last = cn.len() - 1;
        for i in 0..cn.len() {
            let value = if i == 0 {
                cn[i] - diploid_cn
            } else if i == last {
                diploid_cn - cn[i]
            } else {
                cn[i] - cn[i - 1]
            };
            bp.profile.push(value);
            bp.bins.push(bins[i].clone());
        }
    }

    bp
}

/// Convert a breakpoint profile back to absolute copy numbers.
///
/// The interior bins accumulate, while the last bin of each group is
/// reconstructed from the closure term as `diploid_cn - bp[last]`; the two
/// rules coincide only by accident, so the branch order here must mirror
/// `to_breakpoint` to round-trip.
pub fn to_copy_number(p: &BreakpointProfile, diploid_cn: i32) -> CopyNumberProfile {
    let mut cn = CopyNumberProfile::default();
    for (_, (bins, bp)) in group_sorted(&p.bins, &p.profile) {
        let last = bp.len() - 1;
        let mut values: Vec<i32> = Vec::with_capacity(bp.len());
        for i in 0..bp.len() {
            let value = if i == 0 {
                bp[i] + diploid_cn
            } else if i == last {
                diploid_cn - bp[i]
            } else {
                bp[i] + values[i - 1]
            };
            values.push(value);
        }
        cn.profile.extend(values);
        cn.bins.extend(bins);
    }

    cn
}

/// Read a profile table.
///
/// The format is CSV with the header
/// `node,chromosome,allele,start,end,value`; every row attaches one bin to
/// the named node's profile. Rows keep their file order inside each profile.
pub fn read_profile_table(
    reader: Box<dyn BufRead>,
) -> anyhow::Result<BTreeMap<String, (Vec<GenomicBin>, Vec<i32>)>> {
    let mut table: BTreeMap<String, (Vec<GenomicBin>, Vec<i32>)> = BTreeMap::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("node,") {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();
        if fields.len() != 6 {
            anyhow::bail!(
                "expected 6 fields at line {}, got {}: {}",
                lineno + 1,
                fields.len(),
                line
            );
        }

        let start: i32 = fields[3]
            .parse()
            .with_context(|| format!("bad start at line {}", lineno + 1))?;
        let end: i32 = fields[4]
            .parse()
            .with_context(|| format!("bad end at line {}", lineno + 1))?;
        let value: i32 = fields[5]
            .parse()
            .with_context(|| format!("bad value at line {}", lineno + 1))?;

        let entry = table.entry(fields[0].to_string()).or_default();
        entry.0.push(GenomicBin::new(fields[1], fields[2], start, end));
        entry.1.push(value);
    }

    Ok(table)
}

pub fn write_profile_header(writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer, "node,chromosome,allele,start,end,value")?;
    Ok(())
}

pub fn write_profile_rows(
    writer: &mut dyn Write,
    node: &str,
    bins: &[GenomicBin],
    values: &[i32],
) -> anyhow::Result<()> {
    for (bin, value) in bins.iter().zip(values.iter()) {
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            node, bin.chromosome, bin.allele, bin.start, bin.end, value
        )?;
    }
    Ok(())
}
