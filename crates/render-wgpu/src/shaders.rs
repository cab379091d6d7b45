use viewport_scene::ShaderKind;

/// Uniform block, mesh vertex layout and texture bindings shared by every
/// program. Field offsets must match [`crate::uniforms::UniformBlock`].
const PRELUDE: &str = r#"
struct Uniforms {
    projection_view: mat4x4<f32>,
    model: mat4x4<f32>,
    shadow_proj: mat4x4<f32>,
    shadow_view: mat4x4<f32>,
    diffuse_color: vec4<f32>,
    attributes: vec4<f32>,
    shadow_color: vec4<f32>,
    light_color: vec3<f32>,
    texture_flip_y: f32,
    view_position: vec3<f32>,
    shadow_map: f32,
    outline_color: vec3<f32>,
    object_index: f32,
    resolution: vec2<f32>,
    selection: f32,
    gamma: f32,
    exposure: f32,
    bloom: f32,
    outline_width: f32,
    fog_max: f32,
    fog_density: f32,
    fog_start_offset: f32,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) normal: vec3<f32>,
    @location(3) instance: vec4<f32>,
};

fn world_position(v: VertexInput) -> vec4<f32> {
    var scale = 1.0;
    if u.attributes.z > 0.0 {
        scale = (u.projection_view * u.model * vec4<f32>(v.position, 1.0)).z;
    }
    var local = v.position * scale;
    if v.instance.w > 0.0 {
        local = local * v.instance.w;
    }
    var world = u.model * vec4<f32>(local, 1.0);
    world = vec4<f32>(world.xyz + v.instance.xyz, world.w);
    return world;
}

fn load_depth(t: texture_depth_2d, uv: vec2<f32>) -> f32 {
    let size = vec2<f32>(textureDimensions(t));
    let texel = clamp(vec2<i32>(uv * size), vec2<i32>(0), vec2<i32>(size) - vec2<i32>(1));
    return textureLoad(t, texel, 0);
}
"#;

const SCREEN_VERTEX: &str = r#"
struct ScreenOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(v: VertexInput) -> ScreenOutput {
    var out: ScreenOutput;
    out.clip = vec4<f32>(v.position, 1.0);
    out.uv = v.uv;
    return out;
}
"#;

const MESH_VERTEX: &str = r#"
struct MeshOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) world: vec4<f32>,
    @location(2) normal: vec3<f32>,
    @location(3) color: vec3<f32>,
};

@vertex
fn vs_main(v: VertexInput) -> MeshOutput {
    let world = world_position(v);
    var out: MeshOutput;
    out.clip = u.projection_view * world;
    out.uv = v.uv;
    out.world = world;
    out.normal = (u.model * vec4<f32>(v.normal, 0.0)).xyz;
    out.color = v.normal;
    return out;
}
"#;

const DEFAULT_FRAGMENT: &str = r#"
@group(1) @binding(8) var shadow_depth: texture_depth_2d;
@group(1) @binding(9) var mesh_texture: texture_2d<f32>;
@group(1) @binding(10) var specular_map: texture_2d<f32>;
@group(1) @binding(11) var displacement_map: texture_2d<f32>;
@group(1) @binding(12) var normal_map: texture_2d<f32>;
@group(1) @binding(15) var mesh_sampler: sampler;

fn texture_coords(uv: vec2<f32>) -> vec2<f32> {
    var coords = uv;
    if u.texture_flip_y > 0.5 {
        coords.y = 1.0 - coords.y;
    }
    let displace = textureSample(displacement_map, mesh_sampler, coords).rg;
    return coords + displace;
}

fn light_direction() -> vec3<f32> {
    return normalize(vec3<f32>(u.shadow_view[0].z, u.shadow_view[1].z, u.shadow_view[2].z));
}

fn in_shadow(world: vec4<f32>) -> bool {
    let light = u.shadow_proj * u.shadow_view * world;
    let ndc = light.xyz / light.w;
    let uv = clamp(vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5), vec2<f32>(0.0), vec2<f32>(1.0));
    let stored = load_depth(shadow_depth, uv);
    let illuminated = step(ndc.z, stored + 0.0001);
    return illuminated < 1.0 && ndc.z > 0.01;
}

@fragment
fn fs_main(in: MeshOutput) -> @location(0) vec4<f32> {
    let coords = texture_coords(in.uv);
    let texel = textureSample(mesh_texture, mesh_sampler, coords);
    let mapped = textureSample(normal_map, mesh_sampler, coords);
    let specular_texel = textureSample(specular_map, mesh_sampler, coords);
    var color = texel * texel.a + u.diffuse_color * (1.0 - texel.a);
    color = vec4<f32>(color.rgb, color.a + texel.a / 2.0);
    if color.a < 0.5 {
        discard;
    }

    var normal = normalize(in.normal);
    if mapped.a > 0.0 {
        normal = normalize(normal + (u.model * vec4<f32>(mapped.xyz, 0.0)).xyz);
    }

    var specular = u.attributes.x;
    if specular_texel.a > 0.0 {
        specular = specular * specular_texel.r;
    }
    let roughness = max(u.attributes.y, 0.001);

    let light_dir = light_direction();
    let diffuse = max(dot(normal, light_dir), 0.0);
    color = vec4<f32>(color.rgb * (0.8 + diffuse * u.light_color), color.a);

    let shadowed = u.shadow_map > 0.5 && in_shadow(in.world);
    if shadowed {
        color = vec4<f32>(color.rgb * u.shadow_color.rgb, color.a);
    } else {
        let view_dir = normalize(u.view_position - in.world.xyz);
        let reflected = reflect(-light_dir, normal);
        let highlight = pow(max(dot(view_dir, reflected), 0.0), 16.0 / roughness);
        color = vec4<f32>(color.rgb + highlight * u.light_color * specular, color.a);
    }
    return color;
}
"#;

const PRIMITIVE_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: MeshOutput) -> @location(0) vec4<f32> {
    let fade = sqrt(max(in.clip.z, 0.0)) * 0.1;
    return vec4<f32>(in.color * u.diffuse_color.rgb, u.attributes.w - fade);
}
"#;

const INDEX_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: MeshOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(u.object_index, 0.0, 0.0, 1.0);
}
"#;

const LIGHT_FRAGMENT: &str = r#"
@group(1) @binding(1) var frame_color: texture_2d<f32>;
@group(1) @binding(16) var screen_sampler: sampler;

@fragment
fn fs_main(in: ScreenOutput) -> @location(0) vec4<f32> {
    let color = textureSample(frame_color, screen_sampler, in.uv);
    return max(color - vec4<f32>(0.8), vec4<f32>(0.0)) * 5.0;
}
"#;

const COMPOSITE_FRAGMENT: &str = r#"
@group(1) @binding(1) var frame_color: texture_2d<f32>;
@group(1) @binding(2) var frame_depth: texture_depth_2d;
@group(1) @binding(3) var frame_guides: texture_2d<f32>;
@group(1) @binding(4) var guides_depth: texture_depth_2d;
@group(1) @binding(7) var frame_index: texture_2d<f32>;
@group(1) @binding(14) var frame_lighting: texture_2d<f32>;
@group(1) @binding(16) var screen_sampler: sampler;

fn blur(uv: vec2<f32>, direction: vec2<f32>) -> vec4<f32> {
    let off1 = vec2<f32>(1.411764705882353) * direction / u.resolution;
    let off2 = vec2<f32>(3.2941176470588234) * direction / u.resolution;
    let off3 = vec2<f32>(5.176470588235294) * direction / u.resolution;
    var color = textureSample(frame_lighting, screen_sampler, uv) * 0.1964825501511404;
    color += textureSample(frame_lighting, screen_sampler, uv + off1) * 0.2969069646728344;
    color += textureSample(frame_lighting, screen_sampler, uv - off1) * 0.2969069646728344;
    color += textureSample(frame_lighting, screen_sampler, uv + off2) * 0.09447039785044732;
    color += textureSample(frame_lighting, screen_sampler, uv - off2) * 0.09447039785044732;
    color += textureSample(frame_lighting, screen_sampler, uv + off3) * 0.010381362401148057;
    color += textureSample(frame_lighting, screen_sampler, uv - off3) * 0.010381362401148057;
    return color;
}

fn index_at(uv: vec2<f32>) -> f32 {
    return textureSample(frame_index, screen_sampler, uv).r;
}

@fragment
fn fs_main(in: ScreenOutput) -> @location(0) vec4<f32> {
    let uv = in.uv;
    let guides = textureSample(frame_guides, screen_sampler, uv);
    let depth = load_depth(frame_depth, uv);
    let guide_depth = load_depth(guides_depth, uv);
    let bloom = blur(uv, vec2<f32>(1.0, 0.0)) + blur(uv, vec2<f32>(0.0, 1.0));
    let b = u.outline_width;
    let center = index_at(uv);
    let neighbours = array<f32, 8>(
        index_at(uv + vec2<f32>(b, b)),
        index_at(uv + vec2<f32>(-b, b)),
        index_at(uv + vec2<f32>(-b, -b)),
        index_at(uv + vec2<f32>(b, -b)),
        index_at(uv + vec2<f32>(b, 0.0)),
        index_at(uv + vec2<f32>(-b, 0.0)),
        index_at(uv + vec2<f32>(0.0, b)),
        index_at(uv + vec2<f32>(0.0, -b)),
    );
    var edge = false;
    for (var i = 0; i < 8; i++) {
        edge = edge || neighbours[i] != center;
    }

    var color = textureSample(frame_color, screen_sampler, uv) + bloom * u.bloom;
    var rgb = vec3<f32>(1.0) - exp(-color.rgb * u.exposure);
    rgb = pow(rgb, vec3<f32>(1.0 / u.gamma));
    color = vec4<f32>(rgb, color.a);

    if u.selection > 0.0 && center == u.selection && edge {
        color = vec4<f32>(u.outline_color, color.a);
    }
    if guides.a < 0.9 && guides.a > 0.0 {
        let fog = min(pow(max(depth - u.fog_start_offset, 0.0), u.fog_density), u.fog_max);
        color = vec4<f32>(guides.rgb - vec3<f32>(fog), color.a);
    }
    if guide_depth > 0.0 && guide_depth < depth {
        let fade = pow(max(guide_depth - u.fog_start_offset, 0.0), u.fog_density) * 3.0;
        color = vec4<f32>(guides.rgb, 1.0 - fade);
    }
    return color;
}
"#;

/// Full WGSL source of a program.
pub fn source(kind: ShaderKind) -> String {
    let (vertex, fragment) = match kind {
        ShaderKind::Default => (MESH_VERTEX, DEFAULT_FRAGMENT),
        ShaderKind::Primitive => (MESH_VERTEX, PRIMITIVE_FRAGMENT),
        ShaderKind::Depth => (MESH_VERTEX, ""),
        ShaderKind::Index => (MESH_VERTEX, INDEX_FRAGMENT),
        ShaderKind::Light => (SCREEN_VERTEX, LIGHT_FRAGMENT),
        ShaderKind::Composite => (SCREEN_VERTEX, COMPOSITE_FRAGMENT),
    };
    format!("{PRELUDE}{vertex}{fragment}")
}

/// Whether the program has a fragment stage. The depth program only writes
/// depth.
pub fn has_fragment(kind: ShaderKind) -> bool {
    kind != ShaderKind::Depth
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [ShaderKind; 6] = [
        ShaderKind::Default,
        ShaderKind::Primitive,
        ShaderKind::Depth,
        ShaderKind::Index,
        ShaderKind::Light,
        ShaderKind::Composite,
    ];

    #[test]
    fn every_program_has_a_vertex_entry() {
        for kind in KINDS {
            let source = source(kind);
            assert!(source.contains("fn vs_main"), "{}", kind.label());
            assert_eq!(source.contains("fn fs_main"), has_fragment(kind), "{}", kind.label());
        }
    }

    #[test]
    fn depth_units_are_loaded_not_sampled() {
        let composite = source(ShaderKind::Composite);
        assert!(composite.contains("var frame_depth: texture_depth_2d"));
        assert!(!composite.contains("textureSample(frame_depth"));
    }
}
