//! Integration tests for the full combination pass.

use std::fs;
use std::path::{Path, PathBuf};

use yolomerge::combine::{combine_datasets, CombineOptions, Split};
use yolomerge::vocab::SynonymTable;

fn write_dataset(root: &Path, names_yaml: &str) {
    fs::create_dir_all(root).expect("create dataset root");
    fs::write(root.join("data.yaml"), names_yaml).expect("write data yaml");
}

fn write_pair(root: &Path, split: &str, stem: &str, label: &str) {
    let images = root.join(split).join("images");
    let labels = root.join(split).join("labels");
    fs::create_dir_all(&images).expect("create images dir");
    fs::create_dir_all(&labels).expect("create labels dir");
    fs::write(images.join(format!("{stem}.jpg")), stem.as_bytes()).expect("write image");
    fs::write(labels.join(format!("{stem}.txt")), label).expect("write label");
}

fn write_image_only(root: &Path, split: &str, stem: &str) {
    let images = root.join(split).join("images");
    fs::create_dir_all(&images).expect("create images dir");
    fs::create_dir_all(root.join(split).join("labels")).expect("create labels dir");
    fs::write(images.join(format!("{stem}.jpg")), stem.as_bytes()).expect("write image");
}

#[test]
fn two_dataset_end_to_end_merge() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dataset_a = temp.path().join("a");
    write_dataset(&dataset_a, "names:\n  - ball\n  - player\n");
    write_pair(&dataset_a, "train", "frame1", "1 0.5 0.5 0.1 0.1\n");

    let dataset_b = temp.path().join("b");
    write_dataset(&dataset_b, "names:\n  - Ball\n  - referee\n");
    write_pair(&dataset_b, "train", "shot1", "0 0.2 0.2 0.05 0.05\n");

    let output = temp.path().join("out");
    // Only the casing variant merges; 'player' and 'referee' keep their
    // own identities.
    let opts = CombineOptions {
        synonyms: SynonymTable::new([("Ball".to_string(), "ball".to_string())]),
    };

    let summary =
        combine_datasets(&[dataset_a, dataset_b], &output, &opts).expect("combine datasets");

    let manifest = fs::read_to_string(output.join("data.yaml")).expect("read manifest");
    assert!(manifest.contains("nc: 3"));
    let ball_pos = manifest.find("ball").expect("ball in manifest");
    let player_pos = manifest.find("player").expect("player in manifest");
    let referee_pos = manifest.find("referee").expect("referee in manifest");
    assert!(ball_pos < player_pos && player_pos < referee_pos);

    // Dataset A: 'player' keeps unified ID 1.
    let label_a = fs::read_to_string(output.join("train/labels/0_train_frame1.txt"))
        .expect("read rewritten label a");
    assert_eq!(label_a, "1 0.5 0.5 0.1 0.1\n");

    // Dataset B: 'Ball' merged into 'ball', unified ID 0.
    let label_b = fs::read_to_string(output.join("train/labels/1_train_shot1.txt"))
        .expect("read rewritten label b");
    assert_eq!(label_b, "0 0.2 0.2 0.05 0.05\n");

    assert!(output.join("train/images/0_train_frame1.jpg").is_file());
    assert!(output.join("train/images/1_train_shot1.jpg").is_file());

    assert_eq!(summary.total_images(), 2);
    assert_eq!(summary.total_labels(), 2);
    assert_eq!(summary.total_invalid_labels(), 0);
    assert_eq!(summary.total_missing_labels(), 0);
}

#[test]
fn shared_filenames_do_not_collide() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dataset_a = temp.path().join("a");
    write_dataset(&dataset_a, "names:\n  - ball\n");
    write_pair(&dataset_a, "train", "frame1", "0 0.5 0.5 0.1 0.1\n");

    let dataset_b = temp.path().join("b");
    write_dataset(&dataset_b, "names:\n  - ball\n");
    write_pair(&dataset_b, "train", "frame1", "0 0.3 0.3 0.2 0.2\n");

    let output = temp.path().join("out");
    let summary = combine_datasets(
        &[dataset_a, dataset_b],
        &output,
        &CombineOptions::default(),
    )
    .expect("combine datasets");

    assert_eq!(summary.total_images(), 2);
    assert!(output.join("train/images/0_train_frame1.jpg").is_file());
    assert!(output.join("train/images/1_train_frame1.jpg").is_file());

    // Both survive with their own contents.
    let first =
        fs::read_to_string(output.join("train/labels/0_train_frame1.txt")).expect("read label");
    let second =
        fs::read_to_string(output.join("train/labels/1_train_frame1.txt")).expect("read label");
    assert_ne!(first, second);
}

#[test]
fn image_with_only_invalid_lines_is_dropped() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dataset = temp.path().join("ds");
    write_dataset(&dataset, "names:\n  - a\n  - b\n  - c\n");
    write_pair(&dataset, "train", "bad", "99 0.1 0.2 0.3 0.4\n");

    let output = temp.path().join("out");
    let summary =
        combine_datasets(&[dataset], &output, &CombineOptions::default()).expect("combine");

    let counts = summary.counts(0, Split::Train);
    assert_eq!(counts.images, 0);
    assert_eq!(counts.labels, 0);
    // One for the out-of-range line, one more for the dropped image.
    assert_eq!(counts.invalid_labels, 2);

    assert!(!output.join("train/images/0_train_bad.jpg").exists());
    assert!(!output.join("train/labels/0_train_bad.txt").exists());
}

#[test]
fn invalid_lines_are_filtered_but_valid_ones_survive() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dataset = temp.path().join("ds");
    write_dataset(&dataset, "names:\n  - a\n  - b\n");
    write_pair(
        &dataset,
        "train",
        "mixed",
        "0 0.5 0.5 0.1 0.1\nnot a label line\n7 0.1 0.1 0.1 0.1\n1 0.2 0.2 0.2 0.2\n",
    );

    let output = temp.path().join("out");
    let summary =
        combine_datasets(&[dataset], &output, &CombineOptions::default()).expect("combine");

    let counts = summary.counts(0, Split::Train);
    assert_eq!(counts.images, 1);
    assert_eq!(counts.labels, 1);
    assert_eq!(counts.invalid_labels, 2);

    let label =
        fs::read_to_string(output.join("train/labels/0_train_mixed.txt")).expect("read label");
    assert_eq!(label, "0 0.5 0.5 0.1 0.1\n1 0.2 0.2 0.2 0.2\n");
}

#[test]
fn missing_label_file_skips_image_and_continues() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dataset = temp.path().join("ds");
    write_dataset(&dataset, "names:\n  - ball\n");
    write_image_only(&dataset, "train", "orphan");
    write_pair(&dataset, "train", "good", "0 0.5 0.5 0.1 0.1\n");

    let output = temp.path().join("out");
    let summary =
        combine_datasets(&[dataset], &output, &CombineOptions::default()).expect("combine");

    let counts = summary.counts(0, Split::Train);
    assert_eq!(counts.missing_labels, 1);
    assert_eq!(counts.images, 1);
    assert!(!output.join("train/images/0_train_orphan.jpg").exists());
    assert!(output.join("train/images/0_train_good.jpg").is_file());
}

#[test]
fn no_orphan_outputs() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dataset = temp.path().join("ds");
    write_dataset(&dataset, "names:\n  - ball\n");
    write_pair(&dataset, "train", "keep", "0 0.5 0.5 0.1 0.1\n");
    write_pair(&dataset, "train", "drop", "9 0.5 0.5 0.1 0.1\n");
    write_image_only(&dataset, "train", "orphan");
    write_pair(&dataset, "valid", "other", "0 0.4 0.4 0.2 0.2\n");

    let output = temp.path().join("out");
    combine_datasets(&[dataset], &output, &CombineOptions::default()).expect("combine");

    // Every output image has a label file with at least one line, and
    // every label file has an image.
    for split in Split::ALL {
        let images_dir = output.join(split.as_str()).join("images");
        let labels_dir = output.join(split.as_str()).join("labels");

        let image_stems: Vec<String> = fs::read_dir(&images_dir)
            .expect("read images dir")
            .map(|e| stem_of(&e.expect("dir entry").path()))
            .collect();
        let label_stems: Vec<String> = fs::read_dir(&labels_dir)
            .expect("read labels dir")
            .map(|e| stem_of(&e.expect("dir entry").path()))
            .collect();

        let mut sorted_images = image_stems.clone();
        sorted_images.sort();
        let mut sorted_labels = label_stems.clone();
        sorted_labels.sort();
        assert_eq!(sorted_images, sorted_labels);

        for entry in fs::read_dir(&labels_dir).expect("read labels dir") {
            let path = entry.expect("dir entry").path();
            let content = fs::read_to_string(&path).expect("read label");
            assert!(
                content.lines().count() >= 1,
                "label file {} is empty",
                path.display()
            );
        }
    }
}

#[test]
fn rewritten_ids_are_in_unified_range() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dataset_a = temp.path().join("a");
    write_dataset(&dataset_a, "names:\n  - ball\n  - player\n  - referee\n");
    write_pair(
        &dataset_a,
        "train",
        "one",
        "2 0.1 0.1 0.1 0.1\n0 0.2 0.2 0.2 0.2\n",
    );

    let dataset_b = temp.path().join("b");
    write_dataset(&dataset_b, "names:\n  - Ball\n  - net\n");
    write_pair(&dataset_b, "test", "two", "1 0.3 0.3 0.3 0.3\n");

    let output = temp.path().join("out");
    combine_datasets(
        &[dataset_a, dataset_b],
        &output,
        &CombineOptions::default(),
    )
    .expect("combine");

    let manifest = fs::read_to_string(output.join("data.yaml")).expect("read manifest");
    let nc: usize = manifest
        .lines()
        .find_map(|l| l.strip_prefix("nc: "))
        .expect("nc in manifest")
        .trim()
        .parse()
        .expect("nc parses");

    for split in Split::ALL {
        let labels_dir = output.join(split.as_str()).join("labels");
        for entry in fs::read_dir(&labels_dir).expect("read labels dir") {
            let content =
                fs::read_to_string(entry.expect("dir entry").path()).expect("read label");
            for line in content.lines() {
                let id: usize = line
                    .split_whitespace()
                    .next()
                    .expect("class id token")
                    .parse()
                    .expect("class id parses");
                assert!(id < nc, "class ID {id} out of range for nc={nc}");
            }
        }
    }
}

fn stem_of(path: &Path) -> String {
    PathBuf::from(path)
        .file_stem()
        .expect("file stem")
        .to_string_lossy()
        .into_owned()
}
