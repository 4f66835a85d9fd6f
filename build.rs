// Generates the `build` module consumed by `shadow!` in main.rs.
fn main() -> shadow_rs::SdResult<()> {
    shadow_rs::ShadowBuilder::builder().build()?;
    Ok(())
}
