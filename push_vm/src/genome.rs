// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear genomes and their translation to code.
//!
//! A [`Genome`] is a flat list of [`Gene`]s. Instructions whose
//! [`code_blocks`](crate::atom::InstructionMeta::code_blocks) is `k > 0` open `k` code groups in
//! sequence: the first group starts right after the instruction, and each [`Atom::Closer`] ends
//! the current group and starts the next one the instruction still owes. Groups left open at the
//! end of the genome are closed (and owed groups opened and closed) implicitly.
//!
//! The [`OPEN_PAREN`] marker opens one group without contributing an atom to the code, which lets
//! a genome express a nested block that no instruction claims.
//!
//! [`genome_to_code`] and [`code_to_genome`] satisfy:
//!
//! - `genome_to_code(&code_to_genome(c), n) == *c` for every block `c` in which each opening
//!   instruction is followed by its groups (all translated code is of this form), and
//! - `code_to_genome(&genome_to_code(g, n)) == normalize(g)` whenever the code fits in `n` points.

use crate::atom::{Atom, CodeBlock, InstructionMeta, OPEN_PAREN};

/// One position of a genome.
#[derive(Clone, Debug, PartialEq)]
pub struct Gene {
    /// The atom contributed to the code.
    pub atom: Atom,
    /// Silent genes are skipped by translation, together with their closes.
    pub is_silent: bool,
    /// Number of groups closed right after this gene.
    pub closes: u8,
}

impl Gene {
    /// Creates an expressed gene with no trailing closes.
    pub fn new(atom: Atom) -> Self {
        Self {
            atom,
            is_silent: false,
            closes: 0,
        }
    }

    /// Creates a gene holding a bare [`Atom::Closer`].
    pub fn closer() -> Self {
        Self::new(Atom::Closer)
    }

    /// Sets the silent marker.
    #[must_use]
    pub fn silent(mut self, yes: bool) -> Self {
        self.is_silent = yes;
        self
    }

    /// Sets the number of trailing closes.
    #[must_use]
    pub fn with_closes(mut self, n: u8) -> Self {
        self.closes = n;
        self
    }

    /// Groups this gene's atom opens.
    fn opens(&self) -> u8 {
        opens(&self.atom)
    }
}

impl From<Atom> for Gene {
    fn from(atom: Atom) -> Self {
        Self::new(atom)
    }
}

fn opens(atom: &Atom) -> u8 {
    match atom {
        Atom::Instruction(meta) => meta.code_blocks,
        _ => 0,
    }
}

fn is_open_paren(atom: &Atom) -> bool {
    matches!(atom, Atom::Instruction(meta) if &*meta.name == OPEN_PAREN && meta.code_blocks > 0)
}

/// A linear program representation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Genome {
    genes: Vec<Gene>,
}

impl Genome {
    /// Creates a genome from its genes.
    pub fn new(genes: Vec<Gene>) -> Self {
        Self { genes }
    }

    /// Returns the genes.
    #[must_use]
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Number of genes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Returns `true` if the genome has no genes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Iterates over the genes.
    pub fn iter(&self) -> core::slice::Iter<'_, Gene> {
        self.genes.iter()
    }

    /// Returns a copy without the genes at `indices`.
    #[must_use]
    pub fn without(&self, indices: &[usize]) -> Self {
        self.genes
            .iter()
            .enumerate()
            .filter(|(i, _)| !indices.contains(i))
            .map(|(_, g)| g.clone())
            .collect()
    }

    /// Translates to code. See [`genome_to_code`].
    #[must_use]
    pub fn to_code(&self, max_points: usize) -> CodeBlock {
        genome_to_code(self, max_points)
    }
}

impl FromIterator<Gene> for Genome {
    fn from_iter<I: IntoIterator<Item = Gene>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl FromIterator<Atom> for Genome {
    fn from_iter<I: IntoIterator<Item = Atom>>(iter: I) -> Self {
        iter.into_iter().map(Gene::new).collect()
    }
}

impl From<Vec<Gene>> for Genome {
    fn from(genes: Vec<Gene>) -> Self {
        Self::new(genes)
    }
}

/// Tracks open groups while walking a genome.
///
/// Each entry is the number of further groups owed once the current one closes.
#[derive(Default)]
struct Groups {
    owed: Vec<u8>,
}

impl Groups {
    fn open(&mut self, k: u8) {
        self.owed.push(k - 1);
    }

    /// Closes the innermost group. Returns `None` if nothing is open, otherwise whether another
    /// group was opened in its place.
    fn close(&mut self) -> Option<bool> {
        let rest = self.owed.pop()?;
        if rest > 0 {
            self.owed.push(rest - 1);
        }
        Some(rest > 0)
    }

    fn is_empty(&self) -> bool {
        self.owed.is_empty()
    }
}

struct Builder {
    frames: Vec<Vec<Atom>>,
    groups: Groups,
}

impl Builder {
    fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
            groups: Groups::default(),
        }
    }

    fn current(&mut self) -> &mut Vec<Atom> {
        // The root frame is never popped.
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn atom(&mut self, atom: Atom) {
        let k = opens(&atom);
        if k == 0 {
            self.current().push(atom);
            return;
        }
        if !is_open_paren(&atom) {
            self.current().push(atom);
        }
        self.groups.open(k);
        self.frames.push(Vec::new());
    }

    fn close(&mut self) {
        let Some(reopen) = self.groups.close() else {
            return;
        };
        if let Some(atoms) = self.frames.pop() {
            self.current().push(Atom::Block(CodeBlock::new(atoms)));
        }
        if reopen {
            self.frames.push(Vec::new());
        }
    }

    fn finish(mut self) -> CodeBlock {
        while !self.groups.is_empty() {
            self.close();
        }
        CodeBlock::new(self.frames.swap_remove(0))
    }
}

/// Translates a genome into a balanced code block.
///
/// Silent genes are skipped along with their closes, and closers with no open group are ignored.
/// Returns an empty block if the result would exceed `max_points`.
#[must_use]
pub fn genome_to_code(genome: &Genome, max_points: usize) -> CodeBlock {
    let mut b = Builder::new();
    for gene in genome.iter().filter(|g| !g.is_silent) {
        match &gene.atom {
            Atom::Closer => b.close(),
            atom => b.atom(atom.clone()),
        }
        for _ in 0..gene.closes {
            b.close();
        }
    }
    let code = b.finish();
    if code.size() > max_points {
        CodeBlock::default()
    } else {
        code
    }
}

/// Flattens code into a genome.
///
/// Blocks that follow an opening instruction become its groups. Any other block is introduced by
/// an [`OPEN_PAREN`] gene. Every group ends with a closer gene.
#[must_use]
pub fn code_to_genome(code: &CodeBlock) -> Genome {
    let mut genes = Vec::with_capacity(code.size());
    flatten(code.atoms(), &mut genes);
    Genome::new(genes)
}

fn flatten(atoms: &[Atom], out: &mut Vec<Gene>) {
    let mut i = 0;
    while i < atoms.len() {
        let atom = &atoms[i];
        i += 1;
        match atom {
            Atom::Block(block) => {
                out.push(Gene::new(Atom::Instruction(InstructionMeta::new(OPEN_PAREN, 1))));
                flatten(block.atoms(), out);
                out.push(Gene::closer());
            }
            Atom::Closer => {}
            _ => {
                out.push(Gene::new(atom.clone()));
                for _ in 0..opens(atom) {
                    if let Some(Atom::Block(group)) = atoms.get(i) {
                        flatten(group.atoms(), out);
                        i += 1;
                    }
                    out.push(Gene::closer());
                }
            }
        }
    }
}

/// Rewrites a genome into the canonical form produced by [`code_to_genome`].
///
/// Silent genes are dropped, trailing closes become closer genes, epigenetic markers are
/// cleared, unmatched closers are dropped, and closers are appended for groups left open.
#[must_use]
pub fn normalize(genome: &Genome) -> Genome {
    let mut expanded = Vec::with_capacity(genome.len());
    for gene in genome.iter().filter(|g| !g.is_silent) {
        match &gene.atom {
            Atom::Block(block) => {
                expanded.push(Gene::new(Atom::Instruction(InstructionMeta::new(OPEN_PAREN, 1))));
                flatten(block.atoms(), &mut expanded);
                expanded.push(Gene::closer());
            }
            atom => expanded.push(Gene::new(atom.clone())),
        }
        expanded.extend((0..gene.closes).map(|_| Gene::closer()));
    }

    let mut groups = Groups::default();
    let mut out = Vec::with_capacity(expanded.len());
    for gene in expanded {
        if matches!(gene.atom, Atom::Closer) {
            if groups.close().is_none() {
                continue;
            }
        } else if gene.opens() > 0 {
            groups.open(gene.opens());
        }
        out.push(gene);
    }
    while groups.close().is_some() {
        out.push(Gene::closer());
    }
    Genome::new(out)
}
