//! End-to-end tests of the `allele-join` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const VCF_HEADER: &str = "##fileformat=VCFv4.2
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=GQ,Number=1,Type=Integer,Description=\"Genotype Quality\">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read Depth\">
##FORMAT=<ID=AD,Number=R,Type=Integer,Description=\"Allelic depths\">
##FORMAT=<ID=PL,Number=G,Type=Integer,Description=\"Phred-scaled genotype likelihoods\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO";

fn write_vcf(path: &Path, header_suffix: &str, lines: &[&str]) {
    let mut text = format!("{VCF_HEADER}{header_suffix}\n");
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    fs::write(path, text).unwrap();
}

fn allele_join() -> Command {
    Command::cargo_bin("allele-join").unwrap()
}

/// A query VCF with one sample and a two-chromosome reference directory
fn annotate_fixture(dir: &Path) {
    write_vcf(
        &dir.join("query.vcf"),
        "\tFORMAT\tNA12878",
        &[
            "chr1\t100\tq1\tA\tT\t50\tPASS\t.\tGT:GQ:DP:AD:PL\t0/1:99:30:14,16:400,0,380",
            "chr1\t150\t.\tA\tG\t50\tPASS\t.\tGT:GQ\t1/1:60",
            "chr1\t200\t.\tA\tG\t50\tPASS\t.\tGT\t0/1",
            "chr2\t50\t.\tC\tG\t50\tPASS\t.\tGT\t./.",
        ],
    );

    let reference = dir.join("reference");
    fs::create_dir(&reference).unwrap();
    write_vcf(
        &reference.join("ALL.chr1.phase3.genotypes.vcf"),
        "",
        &[
            "1\t100\trs1\tA\tT\t.\tPASS\tAF=0.3",
            "1\t150\trs2\tG\tA\t.\tPASS\tAF=0.1",
            "1\t200\trs3\tT\tC\t.\tPASS\tAF=0.25",
        ],
    );
    write_vcf(&reference.join("ALL.chrX.phase3.genotypes.vcf"), "", &[]);
}

#[test]
fn test_annotate_directory_reference() {
    let dir = TempDir::new().unwrap();
    annotate_fixture(dir.path());
    let out = dir.path().join("out.tsv");

    allele_join()
        .arg("annotate")
        .arg(dir.path().join("query.vcf"))
        .arg(dir.path().join("reference"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("4 query records"));

    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with(
        "CHROM\tPOS\tREF\tALT\tMATCH\tID\tAF\tREFERENCE_REF\tREFERENCE_ALT\t\
         QUERY_ID\tHOM_REF\tHET\tHOM_ALT\tMISSING\tNA12878_GT"
    ));
    assert_eq!(
        lines[1],
        "chr1\t100\tA\tT\tEXACT\trs1\t0.3\tA\tT\tq1\t0\t1\t0\t0\tHET\t99\t30\t14\t16\t400\t0\t380"
    );
    assert!(lines[2].starts_with("chr1\t150\tA\tG\tEXACT\trs2\t0.1\tG\tA\tNA\t0\t0\t1\t0\tHOM_ALT\t60"));
    assert!(lines[3].starts_with("chr1\t200\tA\tG\tCOMPLEMENT\trs3\t0.25\tA\tG\tNA\t0\t1\t0\t0\tHET"));
    assert!(lines[4].starts_with("chr2\t50\tC\tG\tABSENT\tNA\tNA\tNA\tNA\tNA\t0\t0\t0\t1\tMISSING"));
}

#[test]
fn test_annotate_in_memory_matches_windowed() {
    let dir = TempDir::new().unwrap();
    annotate_fixture(dir.path());

    let windowed = allele_join()
        .arg("annotate")
        .arg(dir.path().join("query.vcf"))
        .arg(dir.path().join("reference"))
        .args(["--window-size", "1"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let in_memory = allele_join()
        .arg("annotate")
        .arg(dir.path().join("query.vcf"))
        .arg(dir.path().join("reference"))
        .arg("--in-memory")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(windowed, in_memory);
}

#[test]
fn test_annotate_single_file_reference_json_summary() {
    let dir = TempDir::new().unwrap();
    write_vcf(
        &dir.path().join("query.vcf"),
        "",
        &["chr1\t100\t.\tA\tT\t.\t.\t.", "chr3\t10\t.\tG\tC\t.\t.\t."],
    );
    write_vcf(
        &dir.path().join("panel.vcf"),
        "",
        &["chr1\t100\trs1\tA\tT\t.\t.\tAF=0.5", "chr2\t7\trs7\tC\tT\t.\t.\tAF=0.2"],
    );

    allele_join()
        .args(["--format", "json", "annotate"])
        .arg(dir.path().join("query.vcf"))
        .arg(dir.path().join("panel.vcf"))
        .assert()
        .success()
        .stdout(predicate::str::contains("chr1\t100\tA\tT\tEXACT\trs1\t0.5"))
        .stdout(predicate::str::contains("chr3\t10\tG\tC\tABSENT"))
        .stderr(predicate::str::contains("\"exact\": 1"))
        .stderr(predicate::str::contains("\"mismatched\": 0"))
        .stderr(predicate::str::contains("\"generated_at\""));
}

#[test]
fn test_annotate_counts_genotypes_and_mismatches() {
    let dir = TempDir::new().unwrap();
    write_vcf(
        &dir.path().join("query.vcf"),
        "\tFORMAT\tS1\tS2\tS3\tS4",
        &[
            "chr1\t100\tqa\tA\tT\t.\t.\t.\tGT\t0/0\t0|1\t1/1\t./.",
            "chr1\t200\tqb\tA\tC\t.\t.\t.\tGT\t1|1\t1/0\t1/.\t0/0",
        ],
    );
    write_vcf(
        &dir.path().join("panel.vcf"),
        "",
        &["chr1\t100\trs1\tA\tT\t.\t.\tAF=0.5", "chr1\t200\trs2\tA\tG\t.\t.\tAF=0.2"],
    );

    let output = allele_join()
        .args(["--format", "json", "annotate"])
        .arg(dir.path().join("query.vcf"))
        .arg(dir.path().join("panel.vcf"))
        .assert()
        .success()
        .stderr(predicate::str::contains("\"mismatched\": 1"))
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    let rows: Vec<Vec<&str>> = text.lines().skip(1).map(|l| l.split('\t').collect()).collect();
    assert_eq!(&rows[0][4..14], &["EXACT", "rs1", "0.5", "A", "T", "qa", "1", "1", "1", "1"]);
    assert_eq!(&rows[1][4..14], &["ABSENT", "NA", "NA", "NA", "NA", "qb", "1", "1", "1", "1"]);
}

#[test]
fn test_annotate_unknown_chromosome_fails() {
    let dir = TempDir::new().unwrap();
    write_vcf(&dir.path().join("query.vcf"), "", &["chrZZZ\t1\t.\tA\tT\t.\t.\t."]);
    write_vcf(&dir.path().join("panel.vcf"), "", &["chr1\t1\t.\tA\tT\t.\t.\t."]);

    allele_join()
        .arg("annotate")
        .arg(dir.path().join("query.vcf"))
        .arg(dir.path().join("panel.vcf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown chromosome 'chrZZZ'"));
}

#[test]
fn test_annotate_unsorted_query_fails() {
    let dir = TempDir::new().unwrap();
    write_vcf(
        &dir.path().join("query.vcf"),
        "",
        &["chr2\t1\t.\tA\tT\t.\t.\t.", "chr1\t1\t.\tA\tT\t.\t.\t."],
    );
    write_vcf(&dir.path().join("panel.vcf"), "", &["chr1\t1\t.\tA\tT\t.\t.\t."]);

    allele_join()
        .arg("annotate")
        .arg(dir.path().join("query.vcf"))
        .arg(dir.path().join("panel.vcf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("query stream is not sorted"));
}

#[test]
fn test_annotate_ambiguous_reference_fails() {
    let dir = TempDir::new().unwrap();
    write_vcf(&dir.path().join("query.vcf"), "", &["chr1\t5\t.\tA\tT\t.\t.\t."]);
    write_vcf(
        &dir.path().join("panel.vcf"),
        "",
        &["chr1\t5\trs1\tA\tT\t.\t.\t.", "chr1\t5\trs2\tA\tC\t.\t.\t."],
    );

    allele_join()
        .arg("annotate")
        .arg(dir.path().join("query.vcf"))
        .arg(dir.path().join("panel.vcf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ambiguous match at chr1:5"));
}

#[test]
fn test_membership() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("superset.tsv"),
        "CHROM\tPOS\tREF\tALT\tSAMPLE\tDEPTH\n\
         chr1\t100\tA\tG\ts1\t12\n\
         chr1\t100\tA\tG\ts2\t8\n\
         chr1\t300\tC\tT\ts1\t20\n\
         chr2\t40\tG\tA,T\ts1\t5\n",
    )
    .unwrap();
    write_vcf(
        &dir.path().join("subset.vcf"),
        "",
        &["chr1\t100\t.\tA\tG\t.\t.\t.", "chr2\t40\t.\tG\tA\t.\t.\t."],
    );

    let output = allele_join()
        .arg("membership")
        .arg(dir.path().join("superset.tsv"))
        .arg(dir.path().join("subset.vcf"))
        .args(["--column", "IN_SUBSET"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "CHROM\tPOS\tREF\tALT\tMATCH\tIN_SUBSET\tSAMPLE\tDEPTH",
            "chr1\t100\tA\tG\tEXACT\tTrue\ts1\t12",
            "chr1\t100\tA\tG\tEXACT\tTrue\ts2\t8",
            "chr1\t300\tC\tT\tABSENT\tFalse\ts1\t20",
            "chr2\t40\tG\tA,T\tABSENT\tFalse\ts1\t5",
        ]
    );
}

#[test]
fn test_membership_any_overlap_from_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("superset.tsv"),
        "CHROM\tPOS\tREF\tALT\nchr2\t40\tG\tA,T\n",
    )
    .unwrap();
    write_vcf(&dir.path().join("subset.vcf"), "", &["chr2\t40\t.\tG\tA\t.\t.\t."]);
    fs::write(dir.path().join("config.json"), r#"{"match_mode": "any-overlap"}"#).unwrap();

    allele_join()
        .arg("membership")
        .arg(dir.path().join("superset.tsv"))
        .arg(dir.path().join("subset.vcf"))
        .args(["--column", "IN_SUBSET", "--config"])
        .arg(dir.path().join("config.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("chr2\t40\tG\tA,T\tEXACT\tTrue"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    write_vcf(&dir.path().join("query.vcf"), "", &[]);
    write_vcf(&dir.path().join("panel.vcf"), "", &[]);
    fs::write(dir.path().join("config.json"), r#"{"window_size": 0}"#).unwrap();

    allele_join()
        .arg("annotate")
        .arg(dir.path().join("query.vcf"))
        .arg(dir.path().join("panel.vcf"))
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("window_size must be at least 1"));
}
