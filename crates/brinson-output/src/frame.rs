//! Polars views of attribution results.

use crate::export::AssetRow;
use polars::prelude::*;

/// Asset rows as a `DataFrame`.
pub fn assets_dataframe(rows: &[AssetRow]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Column::new(
            "asset_id".into(),
            rows.iter().map(|r| r.asset_id.clone()).collect::<Vec<String>>(),
        ),
        Column::new(
            "group".into(),
            rows.iter().map(|r| r.group.clone()).collect::<Vec<String>>(),
        ),
        Column::new("w_p".into(), rows.iter().map(|r| r.w_p).collect::<Vec<f64>>()),
        Column::new("w_b".into(), rows.iter().map(|r| r.w_b).collect::<Vec<f64>>()),
        Column::new(
            "asset_return".into(),
            rows.iter().map(|r| r.asset_return).collect::<Vec<f64>>(),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::asset_rows;
    use crate::table::tests::sample_run;

    #[test]
    fn asset_frame_matches_rows() {
        let rows = asset_rows(&sample_run());
        let df = assets_dataframe(&rows).unwrap();
        assert_eq!(df.height(), rows.len());
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["asset_id", "group", "w_p", "w_b", "asset_return"]);
    }
}
