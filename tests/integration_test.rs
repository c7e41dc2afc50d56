//! Pipeline integration tests against in-memory workbooks.
//!
//! Tests cover:
//! - Axis-config location across sheets
//! - Batch orchestration: rendering, skips, strict policy, dry run, filters
//! - Settings loaded from INI text

mod common;

use common::*;
use perfchart::adapters::file_config_adapter::FileConfigAdapter;
use perfchart::domain::axis_config::{LocatedAxisConfig, locate_axis_config};
use perfchart::domain::batch::{BatchContext, BatchReport, EntityOutcome, Stage, run_batch};
use perfchart::domain::error::PerfchartError;
use perfchart::domain::settings::{
    BatchSettings, ChartSettings, UnmatchedPolicy, build_batch_settings, build_chart_settings,
};
use perfchart::domain::table::Cell;
use std::path::Path;
use tempfile::TempDir;

fn run(
    workbook: &MockWorkbook,
    renderer: &MockChartPort,
    axis: &LocatedAxisConfig,
    batch: &BatchSettings,
    output_dir: &Path,
    only: Option<&str>,
    dry_run: bool,
) -> Result<BatchReport, PerfchartError> {
    let chart = ChartSettings::default();
    run_batch(&BatchContext {
        workbook,
        renderer,
        axis,
        chart: &chart,
        batch,
        output_dir,
        only,
        dry_run,
    })
}

fn located(rows: Vec<Vec<Cell>>) -> LocatedAxisConfig {
    let workbook = MockWorkbook::new().with_sheet("参数", axis_grid(rows));
    locate_axis_config(&workbook).unwrap()
}

mod locator {
    use super::*;

    #[test]
    fn finds_table_on_second_sheet() {
        let workbook = MockWorkbook::new()
            .with_sheet("说明", vec![text_row(&["组合名称", "left_min"])])
            .with_sheet(
                "坐标轴",
                axis_grid(vec![axis_row(
                    "稳健",
                    [Some(0.0), Some(0.1), Some(0.05)],
                    [None, None, None],
                )]),
            );

        let found = locate_axis_config(&workbook).unwrap();
        assert_eq!(found.sheet_name, "坐标轴");
        assert_eq!(found.rows.len(), 1);
        assert_eq!(found.rows[0].entity_name, "稳健");
        assert_eq!(found.rows[0].left.step, Some(0.05));
    }

    #[test]
    fn first_qualifying_sheet_wins() {
        let table = |name: &str| axis_grid(vec![axis_row(name, [None; 3], [None; 3])]);
        let workbook = MockWorkbook::new()
            .with_sheet("A", table("甲"))
            .with_sheet("B", table("乙"));

        let found = locate_axis_config(&workbook).unwrap();
        assert_eq!(found.sheet_name, "A");
        assert_eq!(found.rows[0].entity_name, "甲");
    }

    #[test]
    fn unreadable_sheets_are_passed_over() {
        let workbook = MockWorkbook::new()
            .with_error("坏表", "corrupt")
            .with_sheet("参数", axis_grid(vec![axis_row("甲", [None; 3], [None; 3])]));

        assert_eq!(locate_axis_config(&workbook).unwrap().sheet_name, "参数");
    }

    #[test]
    fn aliased_and_spaced_headers_qualify() {
        let header = text_row(&[
            " 组合 ",
            "LEFT MIN",
            "left−max",
            "leftste",
            "right_min",
            "Right-Max",
            "right　step",
        ]);
        let workbook = MockWorkbook::new().with_sheet(
            "cfg",
            vec![header, axis_row("甲", [Some(0.0), Some(1.0), Some(0.5)], [None; 3])],
        );

        let found = locate_axis_config(&workbook).unwrap();
        assert_eq!(found.rows[0].left.max, Some(1.0));
    }

    #[test]
    fn missing_table_names_required_columns() {
        let workbook = MockWorkbook::new().with_sheet("数据", vec![text_row(&["日期", "收益"])]);

        let err = locate_axis_config(&workbook).unwrap_err();
        assert!(matches!(err, PerfchartError::AxisConfigNotFound { .. }));
        let msg = err.to_string();
        assert!(msg.contains("mock.xlsx"));
        assert!(msg.contains("entity_name"));
        assert!(msg.contains("right_step"));
    }
}

mod batch {
    use super::*;

    #[test]
    fn renders_matched_entity_with_explicit_axis() {
        let dir = TempDir::new().unwrap();
        let workbook = MockWorkbook::new()
            .with_sheet("股债平衡组合", data_grid(&DATA_HEADER, three_day_rows()));
        let renderer = MockChartPort::new();
        let axis = located(vec![axis_row(
            "股债平衡",
            [Some(0.0), Some(0.1), Some(0.05)],
            [None, None, None],
        )]);

        let report = run(
            &workbook,
            &renderer,
            &axis,
            &BatchSettings::default(),
            dir.path(),
            None,
            false,
        )
        .unwrap();

        assert_eq!(report.axis_sheet, "参数");
        assert_eq!(report.rendered(), 1);
        let expected = dir.path().join("股债平衡.png");
        match &report.outcomes[0] {
            EntityOutcome::Rendered {
                sheet, path, points, ..
            } => {
                assert_eq!(sheet, "股债平衡组合");
                assert_eq!(path, &expected);
                assert_eq!(*points, 3);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(expected.exists());

        let charts = renderer.rendered.borrow();
        assert_eq!(charts[0].primary.range.ticks, vec![0.0, 0.05, 0.1]);
        assert_eq!(charts[0].x_ticks, vec![0, 1, 2]);
        assert_eq!(charts[0].secondary.range.max, 2000.0);
    }

    #[test]
    fn missing_column_skips_without_writing() {
        let dir = TempDir::new().unwrap();
        let header = ["日期", "组合累计收益", "基准累计收益", "超额收益", "总份额"];
        let rows = vec![data_row("2024/01/02", [0.0, 0.0, 0.0, 100.0, 0.0])];
        let workbook = MockWorkbook::new().with_sheet("稳健组合", data_grid(&header, rows));
        let renderer = MockChartPort::new();
        let axis = located(vec![axis_row("稳健", [None; 3], [None; 3])]);

        let report = run(
            &workbook,
            &renderer,
            &axis,
            &BatchSettings::default(),
            dir.path(),
            None,
            false,
        )
        .unwrap();

        match &report.outcomes[0] {
            EntityOutcome::Skipped { stage, reason, .. } => {
                assert_eq!(*stage, Stage::Cleaned);
                assert!(reason.contains("总资产"), "reason was {reason}");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(renderer.rendered.borrow().is_empty());
        assert!(!dir.path().join("稳健.png").exists());
    }

    #[test]
    fn unmatched_and_failing_entities_do_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let workbook = MockWorkbook::new()
            .with_sheet("甲组合", data_grid(&DATA_HEADER, three_day_rows()))
            .with_sheet("乙组合", data_grid(&DATA_HEADER, three_day_rows()))
            .with_sheet("丙组合", data_grid(&DATA_HEADER, Vec::new()));
        let renderer = MockChartPort::failing_for("乙");
        let axis = located(vec![
            axis_row("不存在", [None; 3], [None; 3]),
            axis_row("乙", [None; 3], [None; 3]),
            axis_row("丙", [None; 3], [None; 3]),
            axis_row("甲", [None; 3], [None; 3]),
        ]);

        let report = run(
            &workbook,
            &renderer,
            &axis,
            &BatchSettings::default(),
            dir.path(),
            None,
            false,
        )
        .unwrap();

        let stages: Vec<Option<Stage>> = report
            .outcomes
            .iter()
            .map(|o| match o {
                EntityOutcome::Skipped { stage, .. } => Some(*stage),
                _ => None,
            })
            .collect();
        assert_eq!(
            stages,
            vec![
                Some(Stage::Matched),
                Some(Stage::Rendered),
                Some(Stage::Cleaned),
                None
            ]
        );
        assert_eq!(report.rendered(), 1);
        assert_eq!(report.skipped(), 3);
        assert!(!dir.path().join("乙.png").exists());
        assert!(dir.path().join("甲.png").exists());
    }

    #[test]
    fn sheet_read_error_is_a_load_skip() {
        let dir = TempDir::new().unwrap();
        let workbook = MockWorkbook::new().with_error("甲组合", "zip error");
        let renderer = MockChartPort::new();
        let axis = located(vec![axis_row("甲", [None; 3], [None; 3])]);

        let report = run(
            &workbook,
            &renderer,
            &axis,
            &BatchSettings::default(),
            dir.path(),
            None,
            false,
        )
        .unwrap();

        match &report.outcomes[0] {
            EntityOutcome::Skipped { stage, reason, .. } => {
                assert_eq!(*stage, Stage::Loaded);
                assert!(reason.contains("zip error"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn strict_policy_aborts_on_unmatched_entity() {
        let dir = TempDir::new().unwrap();
        let workbook = MockWorkbook::new()
            .with_sheet("甲组合", data_grid(&DATA_HEADER, three_day_rows()));
        let renderer = MockChartPort::new();
        let axis = located(vec![axis_row("不存在", [None; 3], [None; 3])]);
        let batch = BatchSettings {
            on_unmatched: UnmatchedPolicy::Fail,
            ..BatchSettings::default()
        };

        let err = run(&workbook, &renderer, &axis, &batch, dir.path(), None, false).unwrap_err();
        assert!(matches!(err, PerfchartError::NoMatchingSheet { ref entity } if entity == "不存在"));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let workbook = MockWorkbook::new()
            .with_sheet("甲组合", data_grid(&DATA_HEADER, three_day_rows()));
        let renderer = MockChartPort::new();
        let axis = located(vec![axis_row("甲", [None; 3], [None; 3])]);

        let report = run(
            &workbook,
            &renderer,
            &axis,
            &BatchSettings::default(),
            dir.path(),
            None,
            true,
        )
        .unwrap();

        assert!(matches!(report.outcomes[0], EntityOutcome::Planned { points: 3, .. }));
        assert!(renderer.rendered.borrow().is_empty());
        assert!(!dir.path().join("甲.png").exists());
    }

    #[test]
    fn only_filter_selects_one_row() {
        let dir = TempDir::new().unwrap();
        let workbook = MockWorkbook::new()
            .with_sheet("甲组合", data_grid(&DATA_HEADER, three_day_rows()))
            .with_sheet("乙组合", data_grid(&DATA_HEADER, three_day_rows()));
        let renderer = MockChartPort::new();
        let axis = located(vec![
            axis_row("甲", [None; 3], [None; 3]),
            axis_row("乙", [None; 3], [None; 3]),
        ]);

        let report = run(
            &workbook,
            &renderer,
            &axis,
            &BatchSettings::default(),
            dir.path(),
            Some("乙"),
            false,
        )
        .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].entity(), "乙");
    }

    #[test]
    fn unsafe_entity_name_is_sanitized_in_file_name() {
        let dir = TempDir::new().unwrap();
        let workbook = MockWorkbook::new()
            .with_sheet("A/B:C组合", data_grid(&DATA_HEADER, three_day_rows()));
        let renderer = MockChartPort::new();
        let axis = located(vec![axis_row("A/B:C", [None; 3], [None; 3])]);

        let report = run(
            &workbook,
            &renderer,
            &axis,
            &BatchSettings::default(),
            dir.path(),
            None,
            false,
        )
        .unwrap();

        let expected = dir.path().join("A_B_C.png");
        assert!(matches!(&report.outcomes[0], EntityOutcome::Rendered { path, .. } if path == &expected));
        assert!(expected.exists());
        assert_eq!(renderer.rendered.borrow()[0].title, "A/B:C");
    }

    #[test]
    fn unsorted_rows_with_bad_dates_are_cleaned() {
        let dir = TempDir::new().unwrap();
        let rows = vec![
            data_row("2024/01/04", [0.05, 0.03, 0.02, 1500.0, 1200.0]),
            data_row("合计", [9.0, 9.0, 9.0, 9.0, 9.0]),
            data_row("2024-01-02", [0.0, 0.0, 0.0, 1200.0, 1000.0]),
        ];
        let workbook = MockWorkbook::new().with_sheet("甲组合", data_grid(&DATA_HEADER, rows));
        let renderer = MockChartPort::new();
        let axis = located(vec![axis_row("甲", [None; 3], [None; 3])]);

        run(
            &workbook,
            &renderer,
            &axis,
            &BatchSettings::default(),
            dir.path(),
            None,
            false,
        )
        .unwrap();

        let charts = renderer.rendered.borrow();
        assert_eq!(charts[0].n_points, 2);
        assert_eq!(charts[0].x_labels, vec!["2024/01/02", "2024/01/04"]);
    }
}

mod settings {
    use super::*;

    #[test]
    fn empty_config_gives_defaults() {
        let adapter = FileConfigAdapter::from_string("").unwrap();
        assert_eq!(build_chart_settings(&adapter).unwrap(), ChartSettings::default());
        assert_eq!(build_batch_settings(&adapter).unwrap(), BatchSettings::default());
    }

    #[test]
    fn overrides_are_applied() {
        let adapter = FileConfigAdapter::from_string(
            "[chart]\nfig_width = 6\nfig_height = 4\ndpi = 100\ntarget_labels = 5\n\
             default_right_step = 500\ndate_format = %m-%d\n\
             [batch]\non_unmatched = FAIL\nheader_offset = 0\n",
        )
        .unwrap();

        let chart = build_chart_settings(&adapter).unwrap();
        assert_eq!(chart.pixel_size(), (600, 400));
        assert_eq!(chart.target_labels, 5);
        assert_eq!(chart.default_right_step, 500.0);
        assert_eq!(chart.date_format, "%m-%d");

        let batch = build_batch_settings(&adapter).unwrap();
        assert_eq!(batch.on_unmatched, UnmatchedPolicy::Fail);
        assert_eq!(batch.header_offset, 0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            ("[chart]\ndpi = 0\n", "dpi"),
            ("[chart]\ntarget_labels = 0\n", "target_labels"),
            ("[chart]\nbar_width = 1.5\n", "bar_width"),
            ("[chart]\nfig_width = -2\n", "fig_width"),
            ("[chart]\ndefault_right_step = 0\n", "default_right_step"),
            ("[chart]\ndate_format = %Q\n", "date_format"),
            ("[chart]\ndate_format = %H:%M\n", "date_format"),
            ("[chart]\ndate_format = %Y-%m-%d %z\n", "date_format"),
        ];
        for (content, key) in cases {
            let adapter = FileConfigAdapter::from_string(content).unwrap();
            match build_chart_settings(&adapter) {
                Err(PerfchartError::ConfigInvalid { key: k, .. }) => assert_eq!(k, key),
                other => panic!("expected invalid {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_unmatched_policy_is_rejected() {
        let adapter = FileConfigAdapter::from_string("[batch]\non_unmatched = ignore\n").unwrap();
        let err = build_batch_settings(&adapter).unwrap_err();
        assert!(err.to_string().contains("ignore"));
    }
}
