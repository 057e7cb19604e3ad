//! Textual exports of the in-memory problem: a free-format MPS rendition
//! for external inspection, and the structure dump (CSR index plus
//! column-to-name map) emitted once per run when requested.

use adeq_core::lp::{LpProblem, RowSense, INFINITE_BOUND};

fn column_label(lp: &LpProblem, j: usize) -> String {
    if lp.variable_name[j].is_empty() {
        format!("C{j:07}")
    } else {
        lp.variable_name[j].clone()
    }
}

fn row_label(lp: &LpProblem, i: usize) -> String {
    if lp.constraint_name[i].is_empty() {
        format!("R{i:07}")
    } else {
        lp.constraint_name[i].clone()
    }
}

/// Render the problem in free MPS format.
pub fn write_mps(lp: &LpProblem, name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("NAME {name}\n"));

    out.push_str("ROWS\n");
    out.push_str(" N  COST\n");
    for i in 0..lp.constraint_count {
        let tag = match lp.sense[i] {
            RowSense::LessOrEqual => 'L',
            RowSense::Equal => 'E',
            RowSense::GreaterOrEqual => 'G',
        };
        out.push_str(&format!(" {}  {}\n", tag, row_label(lp, i)));
    }

    // MPS is column-major; regroup the CSR terms per column first.
    let mut terms_by_column: Vec<Vec<(usize, f64)>> = vec![Vec::new(); lp.variable_count];
    for i in 0..lp.constraint_count {
        let span = lp.row_start[i]..lp.row_start[i] + lp.row_len[i];
        for k in span {
            terms_by_column[lp.column_index[k]].push((i, lp.coefficient[k]));
        }
    }

    out.push_str("COLUMNS\n");
    for j in 0..lp.variable_count {
        let label = column_label(lp, j);
        if lp.linear_cost[j] != 0.0 {
            out.push_str(&format!("    {}  COST  {:.15}\n", label, lp.linear_cost[j]));
        }
        for &(row, coeff) in &terms_by_column[j] {
            out.push_str(&format!("    {}  {}  {:.15}\n", label, row_label(lp, row), coeff));
        }
    }

    out.push_str("RHS\n");
    for i in 0..lp.constraint_count {
        if lp.rhs[i] != 0.0 {
            out.push_str(&format!("    RHS  {}  {:.15}\n", row_label(lp, i), lp.rhs[i]));
        }
    }

    out.push_str("BOUNDS\n");
    for j in 0..lp.variable_count {
        let label = column_label(lp, j);
        if lp.lower_bound[j] != 0.0 && lp.lower_bound[j] > -INFINITE_BOUND {
            out.push_str(&format!(" LO BND  {}  {:.15}\n", label, lp.lower_bound[j]));
        } else if lp.lower_bound[j] <= -INFINITE_BOUND {
            out.push_str(&format!(" MI BND  {}\n", label));
        }
        if lp.upper_bound[j] < INFINITE_BOUND {
            out.push_str(&format!(" UP BND  {}  {:.15}\n", label, lp.upper_bound[j]));
        }
    }

    out.push_str("ENDATA\n");
    out
}

/// Render the CSR row index: one line per constraint with its start offset,
/// term count and sense.
pub fn write_row_structure(lp: &LpProblem) -> String {
    let mut out = String::from("row\tstart\tterms\tsense\n");
    for i in 0..lp.constraint_count {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            i,
            lp.row_start[i],
            lp.row_len[i],
            lp.sense[i].tag()
        ));
    }
    out
}

/// Render the column-to-name map.
pub fn write_column_structure(lp: &LpProblem) -> String {
    let mut out = String::from("column\tname\n");
    for j in 0..lp.variable_count {
        out.push_str(&format!("{}\t{}\n", j, column_label(lp, j)));
    }
    out
}

/// One-line criterion record written next to MPS exports.
pub fn criterion_line(optimal_cost: f64) -> String {
    format!("* Optimal criterion value :   {optimal_cost:.10e}\n")
}
