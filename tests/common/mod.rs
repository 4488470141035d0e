#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes a sample export set (deals, accounts, contacts, leads, tasks).
    pub fn write_exports(&self) -> SampleExports {
        SampleExports {
            deals: self.write("Deals.csv", &deals_csv()),
            accounts: self.write("Accounts.csv", &accounts_csv()),
            contacts: self.write("Contacts.csv", &contacts_csv()),
            leads: self.write("Leads.csv", &leads_csv()),
            tasks: self.write("Tasks.csv", &tasks_csv()),
        }
    }
}

pub struct SampleExports {
    pub deals: PathBuf,
    pub accounts: PathBuf,
    pub contacts: PathBuf,
    pub leads: PathBuf,
    pub tasks: PathBuf,
}

/// Builds a CSV with `width` columns named `Column 0..` where each row only
/// fills the listed `(index, value)` cells.
pub fn sparse_csv(width: usize, rows: &[&[(usize, &str)]]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let headers: Vec<String> = (0..width).map(|i| format!("Column {i}")).collect();
    writer.write_record(&headers).expect("write headers");
    for cells in rows {
        let mut row = vec![String::new(); width];
        for (idx, value) in cells.iter() {
            row[*idx] = value.to_string();
        }
        writer.write_record(&row).expect("write row");
    }
    String::from_utf8(writer.into_inner().expect("flush csv")).expect("utf8 csv")
}

pub fn deals_csv() -> String {
    sparse_csv(
        16,
        &[
            &[(0, "D1"), (5, "A1"), (7, "Negotiation"), (9, "60"), (15, "C1")],
            &[(0, "D2"), (5, "A2"), (7, "Closed Won"), (9, "100"), (15, "C2")],
            &[(0, "D3"), (5, "A404"), (7, "Qualification"), (9, "10"), (15, "C404")],
        ],
    )
}

pub fn accounts_csv() -> String {
    sparse_csv(
        14,
        &[
            &[(0, "A1"), (3, "Acme Corp"), (8, "acme.example"), (12, "1000000"), (13, "7372")],
            &[(0, "A2"), (3, "Globex"), (8, "globex.example"), (12, "250000"), (13, "5045")],
        ],
    )
}

pub fn contacts_csv() -> String {
    sparse_csv(
        39,
        &[
            &[
                (0, "C1"),
                (1, "U1"),
                (2, "Dana Owner"),
                (3, "Ada"),
                (4, "Lovelace"),
                (9, "ada@acme.example"),
                (12, "555-0100"),
                (13, "555-0101"),
                (38, "vip,west"),
            ],
            &[
                (0, "C2"),
                (1, "U2"),
                (2, "Lee Owner"),
                (3, "Grace"),
                (4, "Hopper"),
                (12, "555-0200"),
                (38, "east"),
            ],
            &[(0, "C3"), (1, "U1"), (2, "Renamed Owner"), (3, "Unused")],
        ],
    )
}

pub fn leads_csv() -> String {
    sparse_csv(
        43,
        &[
            &[
                (0, "L1"),
                (1, "U2"),
                (3, "Initech"),
                (4, "Peter"),
                (5, "Gibbons"),
                (6, "peter@initech.example"),
                (7, "555-0300"),
                (8, "initech.example"),
                (9, "Contacted"),
                (10, "50000"),
                (12, "1 Main St"),
                (13, "Austin"),
                (14, "TX"),
                (15, "73301"),
                (19, "vip"),
                (32, "555-0301"),
                (37, "73302"),
                (38, "TX"),
                (41, "PO Box 9"),
                (42, "Austin"),
            ],
            &[(0, "L2"), (1, "U1"), (4, "Milton"), (9, "New")],
        ],
    )
}

pub fn tasks_csv() -> String {
    sparse_csv(
        22,
        &[&[
            (0, "T1"),
            (1, "U1"),
            (3, "Call back"),
            (4, "2024-07-15"),
            (7, "C1"),
            (8, "Ada Lovelace"),
            (9, "Not Started"),
            (10, "High"),
            (17, "Discuss renewal"),
            (21, "followup"),
        ]],
    )
}
