//! Reader for the line-oriented response tensor format. A file holds a number
//! of properties, each with one or more frequency configurations, and only
//! the symmetry-unique elements of each tensor are written out

use std::{iter::Peekable, ops::Range, path::Path, str::Lines};

use log::debug;
use ndarray::IxDyn;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{SpectroError, Tensor, utils::read_file};

/// operator label of a nuclear displacement perturbation
pub const GEO: &str = "GEO";

/// operator label of an electric field perturbation
pub const EL: &str = "EL";

/// One tensor block of a tensor file: a single frequency configuration of a
/// response property
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseProperty {
    pub order: usize,

    /// one label per perturbation, as written in the file
    pub operators: Vec<String>,

    /// number of components of each perturbation
    pub components: Vec<usize>,

    /// frequency of each perturbation in this configuration
    pub frequencies: Vec<f64>,
}

impl ResponseProperty {
    /// number of perturbations with operator `label`, ignoring padding and
    /// case
    pub fn count(&self, label: &str) -> usize {
        self.operators
            .iter()
            .filter(|op| op.trim().eq_ignore_ascii_case(label))
            .count()
    }

    /// the `(EL, GEO)` perturbation counts used to look properties up
    pub fn signature(&self) -> (usize, usize) {
        (self.count(EL), self.count(GEO))
    }

    /// the positions of the `GEO` perturbations followed by the remaining
    /// ones, suitable for moving the geometric axes of the tensor to the front
    pub fn geometric_first(&self) -> Vec<usize> {
        let (geo, other): (Vec<_>, Vec<_>) = (0..self.order)
            .partition(|&i| self.operators[i].trim().eq_ignore_ascii_case(GEO));
        geo.into_iter().chain(other).collect()
    }

    /// frequency of the last electric-field perturbation, which is the
    /// incident frequency of Raman-type properties
    pub fn incident_frequency(&self) -> Option<f64> {
        self.operators
            .iter()
            .zip(&self.frequencies)
            .rev()
            .find(|(op, _)| op.trim().eq_ignore_ascii_case(EL))
            .map(|(_, f)| f.abs())
    }

    /// contiguous runs of perturbations sharing both operator label and
    /// frequency. indices within a run can be permuted freely
    pub fn symmetry_blocks(&self) -> Vec<Range<usize>> {
        let mut ret = Vec::new();
        let mut start = 0;
        for i in 1..=self.order {
            if i == self.order
                || self.operators[i].trim() != self.operators[start].trim()
                || self.frequencies[i] != self.frequencies[start]
            {
                ret.push(start..i);
                start = i;
            }
        }
        ret
    }

    /// every index tuple equivalent to `index` under permutations within the
    /// symmetry blocks
    pub fn equivalent_indices(&self, index: &[usize]) -> Vec<Vec<usize>> {
        let mut ret = vec![Vec::with_capacity(self.order)];
        for block in self.symmetry_blocks() {
            let perms = unique_permutations(&index[block]);
            ret = ret
                .into_iter()
                .flat_map(|head| {
                    perms.iter().map(move |tail| {
                        let mut v = head.clone();
                        v.extend_from_slice(tail);
                        v
                    })
                })
                .collect();
        }
        ret
    }
}

/// all distinct orderings of `v`
fn unique_permutations(v: &[usize]) -> Vec<Vec<usize>> {
    fn helper(
        cur: &mut Vec<usize>,
        rest: &mut Vec<usize>,
        out: &mut FxHashSet<Vec<usize>>,
    ) {
        if rest.is_empty() {
            out.insert(cur.clone());
            return;
        }
        for i in 0..rest.len() {
            let x = rest.remove(i);
            cur.push(x);
            helper(cur, rest, out);
            cur.pop();
            rest.insert(i, x);
        }
    }
    let mut out = FxHashSet::default();
    helper(&mut Vec::new(), &mut v.to_vec(), &mut out);
    let mut ret: Vec<_> = out.into_iter().collect();
    ret.sort();
    ret
}

/// Line cursor over the contents of a tensor file that skips blank lines and
/// keeps track of 1-based line numbers
struct Reader<'a> {
    path: &'a str,
    lines: Peekable<std::iter::Enumerate<Lines<'a>>>,
    lineno: usize,
}

impl<'a> Reader<'a> {
    fn new(contents: &'a str, path: &'a str) -> Self {
        Self {
            path,
            lines: contents.lines().enumerate().peekable(),
            lineno: 0,
        }
    }

    fn skip_blank(&mut self) {
        while self.lines.next_if(|(_, l)| l.trim().is_empty()).is_some() {}
    }

    fn peek(&mut self) -> Option<&'a str> {
        self.skip_blank();
        self.lines.peek().map(|(_, l)| l.trim())
    }

    fn next(&mut self) -> Option<&'a str> {
        self.skip_blank();
        let (i, line) = self.lines.next()?;
        self.lineno = i + 1;
        Some(line.trim())
    }

    fn error(&self, msg: impl Into<String>) -> SpectroError {
        SpectroError::format(self.path, self.lineno, msg)
    }

    fn next_or_eof(&mut self, want: &str) -> Result<&'a str, SpectroError> {
        self.next().ok_or_else(|| {
            self.error(format!("expected `{want}`, got end of file"))
        })
    }

    /// consume the next line and check that it is one of `keywords`
    fn expect(&mut self, keywords: &[&str]) -> Result<(), SpectroError> {
        let line = self.next_or_eof(keywords[0])?;
        if keywords.contains(&line) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`, got `{line}`", keywords[0])))
        }
    }

    /// read `n` whitespace-separated values, possibly spread over several
    /// lines
    fn values<T: std::str::FromStr>(
        &mut self,
        n: usize,
        what: &str,
    ) -> Result<Vec<T>, SpectroError> {
        let mut ret = Vec::with_capacity(n);
        while ret.len() < n {
            let line = self.next_or_eof(what)?;
            for field in line.split_whitespace() {
                ret.push(field.parse().map_err(|_| {
                    self.error(format!("expected {what}, got `{field}`"))
                })?);
            }
        }
        if ret.len() > n {
            return Err(self.error(format!(
                "expected {n} {what}, got {}",
                ret.len()
            )));
        }
        Ok(ret)
    }

    fn single<T: std::str::FromStr>(
        &mut self,
        what: &str,
    ) -> Result<T, SpectroError> {
        let line = self.next_or_eof(what)?;
        line.parse()
            .map_err(|_| self.error(format!("expected {what}, got `{line}`")))
    }
}

/// Parse the tensor file at `path` into index-aligned lists of properties and
/// tensors. A property with several frequency configurations yields one entry
/// per configuration
pub fn parse(
    path: impl AsRef<Path>,
) -> Result<(Vec<ResponseProperty>, Vec<Tensor>), SpectroError> {
    let path = path.as_ref();
    let contents = read_file(path)?;
    parse_str(&contents, &path.display().to_string())
}

/// Like [parse], but on the contents of a file. `path` is only used for error
/// messages
pub fn parse_str(
    contents: &str,
    path: &str,
) -> Result<(Vec<ResponseProperty>, Vec<Tensor>), SpectroError> {
    let mut r = Reader::new(contents, path);
    r.expect(&["VERSION"])?;
    let version = r.next_or_eof("version")?;
    if version.parse::<usize>().ok() != Some(1) {
        return Err(SpectroError::FormatVersion {
            path: path.to_owned(),
            version: version.to_owned(),
        });
    }
    r.expect(&["NUM_PROPERTIES"])?;
    let nprops: usize = r.single("number of properties")?;

    let mut props = Vec::new();
    let mut tensors = Vec::new();
    for _ in 0..nprops {
        r.expect(&["NEW_PROPERTY"])?;
        r.expect(&["ORDER"])?;
        let order: usize = r.single("property order")?;
        r.expect(&["NUM_FREQ_CFGS"])?;
        let ncfgs: usize = r.single("number of frequency configurations")?;
        r.expect(&["OPERATORS"])?;
        let operators: Vec<String> = r.values(order, "operator labels")?;
        r.expect(&["NUM_COMPONENTS", "NUM COMPONENTS"])?;
        let components: Vec<usize> = r.values(order, "component counts")?;
        let components_line = r.lineno;
        r.expect(&["FREQUENCIES"])?;
        let mut frequencies = Vec::with_capacity(ncfgs);
        for _ in 0..ncfgs {
            r.expect(&["CONFIGURATION"])?;
            frequencies.push(r.values::<f64>(order, "frequencies")?);
        }
        debug!(
            "reading property {operators:?} with {ncfgs} configuration(s) \
             from {path}"
        );

        let mut block: Vec<_> = frequencies
            .into_iter()
            .map(|frequencies| ResponseProperty {
                order,
                operators: operators.clone(),
                components: components.clone(),
                frequencies,
            })
            .collect();
        // permuting indices within a symmetry block needs equal axes
        for prop in &block {
            for b in prop.symmetry_blocks() {
                let axes = &components[b.clone()];
                if axes.iter().any(|&n| n != axes[0]) {
                    return Err(SpectroError::format(
                        path,
                        components_line,
                        format!(
                            "perturbations {:?} share a symmetry block but \
                             have component counts {axes:?}",
                            &operators[b]
                        ),
                    ));
                }
            }
        }
        let mut values: Vec<_> = block
            .iter()
            .map(|_| Tensor::zeros(IxDyn(&components)))
            .collect();

        if r.peek().is_some() {
            r.expect(&["VALUES"])?;
        }
        for (prop, tensor) in block.iter().zip(values.iter_mut()) {
            match r.peek() {
                // premature end of file ends the tensor
                None => break,
                Some(_) => r.expect(&["CONFIGURATION"])?,
            }
            read_values(&mut r, prop, tensor)?;
        }
        props.append(&mut block);
        tensors.append(&mut values);
    }
    Ok((props, tensors))
}

/// read (index tuple, value) entries for one configuration until the next
/// `NEW_PROPERTY` or `CONFIGURATION` marker or the end of the file. the value
/// may share the line of its indices or follow on its own line
fn read_values(
    r: &mut Reader,
    prop: &ResponseProperty,
    tensor: &mut Tensor,
) -> Result<(), SpectroError> {
    let order = prop.order;
    while let Some(line) = r.peek() {
        if line == "NEW_PROPERTY" || line == "CONFIGURATION" {
            break;
        }
        let line = r.next_or_eof("index tuple")?;
        let fields: Vec<_> = line.split_whitespace().collect();
        let (idx, value) = if fields.len() == order + 1 {
            (&fields[..order], fields[order])
        } else if fields.len() == order {
            let lineno = r.lineno;
            match r.peek() {
                Some(v) if v.parse::<f64>().is_ok() => {}
                _ => {
                    return Err(SpectroError::format(
                        r.path,
                        lineno,
                        format!("missing value for index `{line}`"),
                    ));
                }
            }
            (&fields[..], r.next_or_eof("value")?)
        } else {
            return Err(r.error(format!(
                "expected {order} indices and a value, got `{line}`"
            )));
        };
        let value: f64 = value
            .parse()
            .map_err(|_| r.error(format!("expected value, got `{value}`")))?;
        let mut index = Vec::with_capacity(order);
        for (f, &n) in idx.iter().zip(&prop.components) {
            match f.parse::<usize>() {
                Ok(i) if (1..=n).contains(&i) => index.push(i - 1),
                _ => {
                    return Err(r.error(format!(
                        "index `{f}` out of range 1..={n}"
                    )));
                }
            }
        }
        for eq in prop.equivalent_indices(&index) {
            tensor[IxDyn(&eq)] = value;
        }
    }
    Ok(())
}
