// Genotype files through the kinship engine and back out through the writers

use approx::assert_abs_diff_eq;
use kinmat::core::EndelmanKinship;
use kinmat::data::load_feature_table;
use kinmat::output::{load_binary, write_matrix, OutputFormat};
use std::io::Write;

const HAPMAP: &str = "rs#\talleles\tchrom\tpos\tstrand\tassembly#\tcenter\tprotLSID\tassayLSID\tpanelLSID\tQCcode\tB73\tMo17\tW22\tOh43
s1\tA/C\t1\t100\t+\tNA\tNA\tNA\tNA\tNA\tNA\tA\tM\tC\tA
s2\tG/T\t1\t200\t+\tNA\tNA\tNA\tNA\tNA\tNA\tGG\tTT\tGT\tNN
s3\tC/T\t2\t50\t+\tNA\tNA\tNA\tNA\tNA\tNA\tC\tC\tT\tY
";

const VCF: &str = "##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tB73\tMo17\tW22\tOh43
1\t100\ts1\tA\tC\t.\t.\t.\tGT\t0/0\t0/1\t1/1\t0/0
1\t200\ts2\tG\tT\t.\t.\t.\tGT\t0/0\t1/1\t0/1\t./.
2\t50\ts3\tC\tT\t.\t.\t.\tGT\t0/0\t0/0\t1/1\t0/1
";

fn write_temp(suffix: &str, body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{}", body).unwrap();
    file
}

#[test]
fn hapmap_and_vcf_give_the_same_kinship() {
    let hapmap = write_temp(".hmp.txt", HAPMAP);
    let vcf = write_temp(".vcf", VCF);

    let from_hapmap = load_feature_table(hapmap.path()).unwrap();
    let from_vcf = load_feature_table(vcf.path()).unwrap();
    assert_eq!(from_hapmap.num_features(), 3);
    assert_eq!(from_vcf.num_features(), 3);

    let a = EndelmanKinship::new(&from_hapmap).num_workers(2).build().unwrap();
    let b = EndelmanKinship::new(&from_vcf).num_workers(2).build().unwrap();
    assert_eq!(a.taxa().names(), vec!["B73", "Mo17", "W22", "Oh43"]);
    for (x, y) in a.upper_triangle().iter().zip(b.upper_triangle()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-9);
    }
}

#[test]
fn binary_output_round_trips() {
    let hapmap = write_temp(".hmp.txt", HAPMAP);
    let table = load_feature_table(hapmap.path()).unwrap();
    let matrix = EndelmanKinship::new(&table).build().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/kinship.bin");
    write_matrix(&path, OutputFormat::Bin, &matrix, "kinmat --format bin").unwrap();
    assert_eq!(load_binary(&path).unwrap(), matrix);
}

#[test]
fn filtered_taxa_are_recomputed_on_the_subset() {
    let hapmap = write_temp(".hmp.txt", HAPMAP);
    let table = load_feature_table(hapmap.path()).unwrap();
    let subset = table.retain_taxa(|t| t.name() != "Oh43").unwrap();
    assert_eq!(subset.num_taxa(), 3);

    let matrix = EndelmanKinship::new(&subset).build().unwrap();
    assert_eq!(matrix.taxa().names(), vec!["B73", "Mo17", "W22"]);
    // B73 and W22 are opposite homozygotes at s1 and s3
    assert!(matrix.get(0, 2) < 0.0);
}

#[test]
fn unsupported_extension_is_rejected() {
    let file = write_temp(".bed", "anything");
    assert!(load_feature_table(file.path()).is_err());
}

#[test]
fn all_missing_vcf_record_is_diploid_and_skipped() {
    let with_gap = VCF.replacen(
        "2\t50",
        "1\t300\ts_gap\tA\tG\t.\t.\t.\tGT\t.\t.\t.\t.\n2\t50",
        1,
    );
    let full = load_feature_table(write_temp(".vcf", &with_gap).path()).unwrap();
    let plain = load_feature_table(write_temp(".vcf", VCF).path()).unwrap();
    assert_eq!(full.num_features(), 4);
    assert!(full.iter().all(|site| site.ploidy() == 2));

    let a = EndelmanKinship::new(&full).num_workers(2).build().unwrap();
    let b = EndelmanKinship::new(&plain).num_workers(2).build().unwrap();
    assert_eq!(a.upper_triangle(), b.upper_triangle());
}
