//! Table detection from ruling lines and text alignment.
//!
//! Two kinds of candidates are collected for every page:
//!
//! - **Ruled**: grids formed by connected horizontal and vertical rulings.
//!   The distinct line positions define the cell boundaries and each span
//!   lands in the cell containing its center.
//! - **Stream**: regions of consecutive rows whose text starts at recurring
//!   x positions, in the spirit of Camelot's Stream mode.
//!
//! Overlapping candidates are resolved by fill ratio so every region of the
//! page yields at most one table.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::Result;
use crate::model::{Rect, Table};

use super::backend::{PdfPage, Ruling, TextSpan};
use super::layout::push_joined;

/// Where a candidate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TableSource {
    /// Grid of ruling lines
    Ruled,
    /// Whitespace-aligned text
    Stream,
}

/// A table region proposed by one of the detection strategies.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Detection strategy
    pub source: TableSource,
    /// Cell grid
    pub table: Table,
    /// Region of the page the candidate covers
    pub bbox: Rect,
}

impl Candidate {
    /// Create a candidate, recording the region on the table.
    pub fn new(source: TableSource, table: Table, bbox: Rect) -> Self {
        Self {
            source,
            table: table.with_bbox(bbox),
            bbox,
        }
    }

    /// Fraction of non-empty cells.
    pub fn fill_ratio(&self) -> f32 {
        self.table.fill_ratio()
    }
}

/// A row of text spans in a stream table.
#[derive(Debug, Clone)]
pub struct TableRowData {
    /// Y position of this row
    pub y: f32,
    /// Spans in this row, sorted by X
    pub spans: Vec<TextSpan>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of stream columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
    /// Ruling positions closer than this are the same grid line (points)
    pub snap_tolerance: f32,
    /// Slack when testing whether two rulings touch (points)
    pub intersection_tolerance: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 10,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
            snap_tolerance: 3.0,
            intersection_tolerance: 2.0,
        }
    }
}

/// Detects tables on a page.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect the tables of a page, top to bottom then left to right.
    ///
    /// Finding no tables is a normal outcome.
    pub fn detect_tables(&self, page: &dyn PdfPage) -> Result<Vec<Table>> {
        let spans = page.text_spans()?;
        let geometry = page.geometry()?;
        Ok(self.detect_in(page.number(), &spans, &geometry.rulings))
    }

    /// Detect tables from already extracted spans and rulings.
    pub fn detect_in(&self, page: u32, spans: &[TextSpan], rulings: &[Ruling]) -> Vec<Table> {
        let mut candidates = self.ruled_candidates(page, spans, rulings);
        candidates.extend(self.stream_candidates(page, spans));
        log::debug!(
            "TableDetector: page {} has {} candidates",
            page,
            candidates.len()
        );

        resolve_overlaps(candidates)
            .into_iter()
            .map(|c| c.table)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Ruled (lattice) detection
    // -----------------------------------------------------------------------

    /// Build one candidate per connected grid of rulings.
    pub fn ruled_candidates(
        &self,
        page: u32,
        spans: &[TextSpan],
        rulings: &[Ruling],
    ) -> Vec<Candidate> {
        let rulings = merge_collinear(rulings, self.config.snap_tolerance);
        if rulings.len() < 4 {
            return vec![];
        }

        let mut candidates = Vec::new();
        for group in connected_grids(&rulings, self.config.intersection_tolerance) {
            let mut xs = Vec::new();
            let mut ys = Vec::new();
            for &i in &group {
                if rulings[i].is_horizontal() {
                    ys.push(rulings[i].position);
                } else {
                    xs.push(rulings[i].position);
                }
            }

            let xs = snap_positions(xs, self.config.snap_tolerance);
            let mut ys = snap_positions(ys, self.config.snap_tolerance);
            ys.reverse(); // top to bottom

            let rows = ys.len().saturating_sub(1);
            let cols = xs.len().saturating_sub(1);
            if rows < self.config.min_rows || cols < self.config.min_columns {
                log::debug!("TableDetector: grid {}x{} too small", rows, cols);
                continue;
            }

            let bbox = Rect::new(xs[0], ys[rows], xs[cols], ys[0]);
            let table = Table::from_rows(page, fill_grid(spans, &xs, &ys));
            if table.filled_cell_count() == 0 {
                log::debug!("TableDetector: grid {}x{} has no text", rows, cols);
                continue;
            }

            log::debug!(
                "TableDetector: ruled grid {}x{}, fill {:.2}",
                rows,
                cols,
                table.fill_ratio()
            );
            candidates.push(Candidate::new(TableSource::Ruled, table, bbox));
        }

        candidates
    }

    // -----------------------------------------------------------------------
    // Stream (whitespace alignment) detection
    // -----------------------------------------------------------------------

    /// Find regions of consistently aligned rows.
    pub fn stream_candidates(&self, page: u32, spans: &[TextSpan]) -> Vec<Candidate> {
        if spans.len() < self.config.min_rows * self.config.min_columns {
            return vec![];
        }

        let rows = self.group_into_rows(spans);
        if rows.len() < self.config.min_rows {
            return vec![];
        }

        let columns = self.detect_columns(&rows);
        log::debug!(
            "TableDetector: detected {} columns at positions: {:?}",
            columns.len(),
            columns
        );
        if columns.len() < self.config.min_columns {
            return vec![];
        }

        let mut candidates = Vec::new();
        for (start_row, end_row) in self.find_table_regions(&rows, &columns) {
            let table_rows = &rows[start_row..=end_row];

            // Re-detect columns for this specific table region
            let table_columns = self.detect_columns(table_rows);
            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if self.is_list_pattern(table_rows, &table_columns) {
                log::debug!("TableDetector: skipping region, detected as list pattern");
                continue;
            }

            let region_spans = table_rows.iter().flat_map(|r| r.spans.iter());
            let bbox = region_spans.fold(None::<Rect>, |acc, s| {
                let r = Rect::new(s.x, s.bottom(), s.right(), s.top());
                Some(match acc {
                    None => r,
                    Some(a) => Rect::new(
                        a.left.min(r.left),
                        a.bottom.min(r.bottom),
                        a.right.max(r.right),
                        a.top.max(r.top),
                    ),
                })
            });
            let Some(bbox) = bbox else { continue };

            let table = self.to_table(page, table_rows, &table_columns, bbox.right);
            candidates.push(Candidate::new(TableSource::Stream, table, bbox));
        }

        candidates
    }

    /// Group spans into rows by Y position.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<TableRowData> {
        let mut sorted_spans = spans.to_vec();
        sorted_spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current: Vec<TextSpan> = Vec::new();
        let mut current_y: Option<f32> = None;

        let finish = |spans: Vec<TextSpan>| {
            let y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
            let mut spans = spans;
            spans.sort_by(|a, b| a.x.total_cmp(&b.x));
            TableRowData { y, spans }
        };

        for span in sorted_spans {
            let y_tolerance = span.font_size * self.config.y_tolerance_factor;
            match current_y {
                Some(y) if (span.y - y).abs() <= y_tolerance => current.push(span),
                _ => {
                    if !current.is_empty() {
                        rows.push(finish(std::mem::take(&mut current)));
                    }
                    current_y = Some(span.y);
                    current.push(span);
                }
            }
        }
        if !current.is_empty() {
            rows.push(finish(current));
        }

        rows
    }

    /// Detect column boundaries from recurring left edges.
    ///
    /// Only rows with several spans are counted. A paragraph indent on
    /// single-span lines is not a column.
    fn detect_columns(&self, rows: &[TableRowData]) -> Vec<f32> {
        let counted: Vec<&TableRowData> = rows.iter().filter(|r| r.spans.len() >= 2).collect();
        if counted.len() < self.config.min_rows {
            return vec![];
        }

        // Left edges bucketed to 5pt, counted once per row
        let bucket_size = 5.0;
        let mut edge_counts: BTreeMap<i32, usize> = BTreeMap::new();
        for row in &counted {
            let buckets: BTreeSet<i32> = row
                .spans
                .iter()
                .map(|s| (s.x / bucket_size).round() as i32)
                .collect();
            for bucket in buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((counted.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut merged_edges: Vec<f32> = Vec::new();
        for (bucket, count) in edge_counts {
            if count < min_occurrences {
                continue;
            }
            let edge = bucket as f32 * bucket_size;
            match merged_edges.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged_edges.push(edge),
            }
        }

        merged_edges
    }

    /// Find contiguous row regions that form tables.
    fn find_table_regions(&self, rows: &[TableRowData], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut current_start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let aligned =
                self.calculate_alignment_score(row, columns) >= self.config.min_alignment_ratio;

            match (aligned, current_start) {
                (true, None) => current_start = Some(i),
                (false, Some(start)) => {
                    regions.extend(self.close_region(rows, columns, start, i - 1));
                    current_start = None;
                }
                _ => {}
            }
        }

        if let Some(start) = current_start {
            regions.extend(self.close_region(rows, columns, start, rows.len() - 1));
        }

        regions
    }

    /// Trim rows filling a single cell from both ends of an aligned run and
    /// keep it only if enough rows span several columns.
    fn close_region(
        &self,
        rows: &[TableRowData],
        columns: &[f32],
        start: usize,
        end: usize,
    ) -> Option<(usize, usize)> {
        let multi_cell = |i: &usize| occupied_columns(&rows[*i], columns) >= 2;
        let first = (start..=end).find(multi_cell)?;
        let last = (start..=end).rev().find(multi_cell)?;

        let multi_cell_rows = (first..=last).filter(multi_cell).count();
        if multi_cell_rows < self.config.min_rows {
            return None;
        }
        Some((first, last))
    }

    /// Calculate how well a row aligns with the detected columns.
    fn calculate_alignment_score(&self, row: &TableRowData, columns: &[f32]) -> f32 {
        if row.spans.is_empty() || columns.is_empty() {
            return 0.0;
        }

        let tolerance = 5.0;
        let aligned_spans = row
            .spans
            .iter()
            .filter(|span| columns.iter().any(|col| (span.x - col).abs() <= tolerance))
            .count();

        aligned_spans as f32 / row.spans.len() as f32
    }

    /// Convert aligned rows into a rectangular table.
    fn to_table(&self, page: u32, rows: &[TableRowData], columns: &[f32], right_x: f32) -> Table {
        let grid = rows
            .iter()
            .map(|row| {
                let mut cells = vec![String::new(); columns.len()];
                for span in &row.spans {
                    let col_idx = find_column_for_span(span.x, columns, right_x);
                    push_joined(&mut cells[col_idx], &span.text);
                }
                cells
            })
            .collect();
        Table::from_rows(page, grid)
    }

    /// Check if detected table rows actually represent a numbered or bulleted list.
    ///
    /// When a list marker like "1." and its text are separate spans, the
    /// list looks like a two-column table.
    fn is_list_pattern(&self, rows: &[TableRowData], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullet_count = 0;
        let mut number_count = 0;

        for row in rows {
            if let Some(span) = row.spans.first() {
                let text = span.text.trim();
                if is_bullet_marker(text) {
                    bullet_count += 1;
                } else if is_number_marker(text) {
                    number_count += 1;
                }
            }
        }

        let bullet_ratio = bullet_count as f32 / rows.len() as f32;
        let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;

        // Bullet markers are almost never real table data
        if bullet_ratio >= 0.5 {
            return true;
        }

        // Only reject numbered 2-column regions; real tables often number rows.
        columns.len() == 2 && total_ratio >= 0.5
    }
}

/// Keep the best of every group of overlapping candidates.
///
/// Candidates are ranked by fill ratio, then ruled before stream, then by
/// cell count, then top-most, then left-most. Each candidate is kept unless
/// it overlaps one ranked above it. The survivors are returned top to
/// bottom, then left to right.
pub fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(rank);

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.iter().any(|k| k.bbox.overlaps(&candidate.bbox)) {
            log::debug!(
                "TableDetector: dropping {:?} candidate (fill {:.2}) overlapping a better one",
                candidate.source,
                candidate.fill_ratio()
            );
            continue;
        }
        kept.push(candidate);
    }

    kept.sort_by(|a, b| {
        b.bbox
            .top
            .total_cmp(&a.bbox.top)
            .then(a.bbox.left.total_cmp(&b.bbox.left))
    });
    kept
}

fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    let fill = |c: &Candidate| (c.fill_ratio() * 1_000_000.0).round() as i64;
    fill(b)
        .cmp(&fill(a))
        .then(a.source.cmp(&b.source))
        .then(b.table.cell_count().cmp(&a.table.cell_count()))
        .then(b.bbox.top.total_cmp(&a.bbox.top))
        .then(a.bbox.left.total_cmp(&b.bbox.left))
}

/// Number of distinct columns a row puts text into.
fn occupied_columns(row: &TableRowData, columns: &[f32]) -> usize {
    let right_x = row.spans.iter().map(|s| s.right()).fold(f32::MIN, f32::max);
    row.spans
        .iter()
        .map(|s| find_column_for_span(s.x, columns, right_x))
        .collect::<BTreeSet<usize>>()
        .len()
}

/// Find which column a span belongs to based on its X position.
fn find_column_for_span(span_x: f32, columns: &[f32], right_x: f32) -> usize {
    for (i, &col_start) in columns.iter().enumerate() {
        let col_end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        // Allow 10pt for spans slightly before the column start
        if span_x >= col_start - 10.0 && span_x < col_end - 10.0 {
            return i;
        }
    }

    // Closest column
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (span_x - **a).abs().total_cmp(&(span_x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Merge rulings that lie on the same line and overlap or touch.
fn merge_collinear(rulings: &[Ruling], tolerance: f32) -> Vec<Ruling> {
    let mut sorted = rulings.to_vec();
    sorted.sort_by(|a, b| {
        a.orientation
            .cmp(&b.orientation)
            .then(a.position.total_cmp(&b.position))
            .then(a.start.total_cmp(&b.start))
    });

    let mut merged: Vec<Ruling> = Vec::new();
    for ruling in sorted {
        if let Some(last) = merged.last_mut() {
            if last.orientation == ruling.orientation
                && (last.position - ruling.position).abs() <= tolerance
                && ruling.start <= last.end + tolerance
            {
                last.end = last.end.max(ruling.end);
                continue;
            }
        }
        merged.push(ruling);
    }
    merged
}

/// Group rulings into connected grids; returns indices per group.
fn connected_grids(rulings: &[Ruling], tolerance: f32) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..rulings.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..rulings.len() {
        for j in (i + 1)..rulings.len() {
            if rulings[i].intersects(&rulings[j], tolerance) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[b] = a;
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..rulings.len() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(i);
    }
    groups.into_values().collect()
}

/// Sort positions and average those within `tolerance` of each other.
fn snap_positions(mut positions: Vec<f32>, tolerance: f32) -> Vec<f32> {
    positions.sort_by(f32::total_cmp);

    let mut clusters: Vec<Vec<f32>> = Vec::new();
    for p in positions {
        match clusters.last_mut() {
            Some(cluster) if p - cluster[cluster.len() - 1] <= tolerance => cluster.push(p),
            _ => clusters.push(vec![p]),
        }
    }
    clusters
        .into_iter()
        .map(|c| c.iter().sum::<f32>() / c.len() as f32)
        .collect()
}

/// Place span text into grid cells by span center.
///
/// `xs` ascend left to right, `ys` descend top to bottom.
fn fill_grid(spans: &[TextSpan], xs: &[f32], ys: &[f32]) -> Vec<Vec<String>> {
    let rows = ys.len() - 1;
    let cols = xs.len() - 1;
    let mut cell_spans: Vec<Vec<Vec<&TextSpan>>> = vec![vec![Vec::new(); cols]; rows];

    for span in spans {
        let cx = span.center_x();
        let cy = span.center_y();
        let col = (0..cols).find(|&c| cx >= xs[c] && cx < xs[c + 1]);
        let row = (0..rows).find(|&r| cy <= ys[r] && cy > ys[r + 1]);
        if let (Some(r), Some(c)) = (row, col) {
            cell_spans[r][c].push(span);
        }
    }

    cell_spans
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|mut spans| {
                    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));
                    let mut text = String::new();
                    for span in spans {
                        push_joined(&mut text, &span.text);
                    }
                    text
                })
                .collect()
        })
        .collect()
}

/// Check if text is a bullet marker (•, -, etc.).
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "※" | "□" | "◆" | "◇" | "▶" | "▷" | "☞" | "➤" | "➜"
    )
}

/// Check if text is a number-style list marker (1., 2), a., 一、, (三) etc.).
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.trim().chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    // Chinese enumeration: 一、 二、 (一) （二）
    let inner = cleaned
        .trim_start_matches(&['(', '（'][..])
        .trim_end_matches(&[')', '）', '、', '.'][..]);
    if inner != cleaned && !inner.is_empty() && inner.chars().all(is_chinese_numeral) {
        return true;
    }

    // Digits followed by ".", ")" or "、"
    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let prefix = &cleaned[..pos];
        let suffix = &cleaned[pos..];
        if !prefix.is_empty() && (suffix == "." || suffix == ")" || suffix == "、") {
            return true;
        }
    }

    // Just a bare number
    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    // Letter marker: "a.", "B)"
    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_ascii_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}

fn is_chinese_numeral(c: char) -> bool {
    "一二三四五六七八九十百壹貳參肆伍陸柒捌玖拾".contains(c)
}
