fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Emit the commit id reported by the metrics_status gauge
    vergen::EmitBuilder::builder().git_sha(true).emit()?;

    println!("cargo:rerun-if-env-changed=VERGEN_GIT_SHA");

    Ok(())
}
